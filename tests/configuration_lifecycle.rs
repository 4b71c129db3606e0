//! Integration tests for the full configuration lifecycle: load a
//! hand-written jsonc document, edit it through the library API, save it,
//! and load it back.

use std::fs;

use serde_json::{json, Value};
use tempfile::TempDir;

use remapd::config::device::DeviceIdentifiers;
use remapd::config::ConfigDocument;
use remapd::connected_devices::{ConnectedDevice, ConnectedDevices, Descriptions};
use remapd::manipulator;

const DOCUMENT: &str = r#"{
    // written by hand, comments and all
    "global": {
        "show_in_menu_bar": false
    },
    "profiles": [
        {
            "name": "Default profile",
            "selected": true,
            "simple_modifications": [
                {"from": {"key_code": "caps_lock"}, "to": [{"key_code": "escape"}]}
            ],
            "complex_modifications": {
                "parameters": {"basic.to_if_alone_timeout_milliseconds": 500},
                "rules": [
                    {
                        "description": "hyper key",
                        "manipulators": [
                            {
                                "type": "basic",
                                "from": {"key_code": "caps_lock", "modifiers": {"optional": ["any"]}},
                                "to": [{"key_code": "left_shift", "modifiers": ["left_command", "left_control", "left_option"]}],
                                "to_if_alone": [{"key_code": "escape"}]
                            }
                        ]
                    }
                ]
            },
            "devices": [
                {
                    "identifiers": {"vendor_id": 1278, "product_id": 33, "is_keyboard": true},
                    "ignore": true
                }
            ],
            "experimental_setting": {"kept": true}
        },
        {"name": "Gaming"}
    ]
}"#;

#[test]
fn edit_save_reload_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("remapd.json");
    fs::write(&path, DOCUMENT).unwrap();

    let mut document = ConfigDocument::load(&path);
    assert!(document.loaded());
    assert!(!document.global().show_in_menu_bar());
    assert_eq!(document.profiles().len(), 2);
    assert_eq!(document.selected_profile().name(), "Default profile");

    // Every manipulator in the document constructs cleanly.
    for profile in document.profiles() {
        for rule in profile.complex_modifications().rules() {
            assert!(manipulator::lint_rule(rule).is_empty());
        }
    }

    // Edit through the API: select the other profile, add a remapping.
    document.select_profile(1);
    document.selected_profile_mut().simple_modifications_mut().update(&json!([
        {"from": {"key_code": "escape"}, "to": [{"key_code": "grave_accent_and_tilde"}]},
    ]));

    document.sync_save_to_file(&path).unwrap();
    let reloaded = ConfigDocument::load(&path);

    assert!(reloaded.loaded());
    assert_eq!(reloaded.selected_profile().name(), "Gaming");
    assert_eq!(
        reloaded.selected_profile().simple_modifications().pairs().len(),
        1
    );

    // Hand-written extras and per-device overrides survive the round trip.
    let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["profiles"][0]["experimental_setting"], json!({"kept": true}));
    assert_eq!(saved["profiles"][0]["devices"][0]["ignore"], json!(true));
    assert_eq!(
        saved["profiles"][0]["complex_modifications"]["parameters"]
            ["basic.to_if_alone_timeout_milliseconds"],
        json!(500)
    );
}

#[test]
fn device_probe_and_override_lifecycle() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("remapd.json");
    fs::write(&path, DOCUMENT).unwrap();

    let mut document = ConfigDocument::load(&path);
    let profile = document.selected_profile_mut();

    // The ignored keyboard from the document.
    let existing = DeviceIdentifiers::keyboard(1278, 33);
    assert!(profile.device(&existing).ignore());

    // Probing an unknown mouse reports the pointing-device default without
    // growing the device list.
    let mouse = DeviceIdentifiers::pointing_device(0x046d, 0xc52b);
    assert!(profile.device(&mouse).ignore());
    assert_eq!(profile.devices().len(), 1);

    // Overriding inserts exactly one entry.
    profile.device_mut(&mouse).set_ignore(false);
    assert_eq!(profile.devices().len(), 2);

    document.sync_save_to_file(&path).unwrap();
    let reloaded = ConfigDocument::load(&path);
    assert!(!reloaded.selected_profile().device(&mouse).ignore());
}

#[test]
fn repeated_saves_keep_one_backup_per_day() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("remapd.json");
    fs::write(&path, DOCUMENT).unwrap();

    let document = ConfigDocument::load(&path);
    document.sync_save_to_file(&path).unwrap();
    document.sync_save_to_file(&path).unwrap();
    document.sync_save_to_file(&path).unwrap();

    let backups = temp.path().join("automatic_backups");
    assert_eq!(fs::read_dir(&backups).unwrap().count(), 1);

    // The backup holds a loadable document.
    let backup_path = fs::read_dir(&backups).unwrap().next().unwrap().unwrap().path();
    let backed_up = ConfigDocument::load(&backup_path);
    assert!(backed_up.loaded());
}

#[test]
fn connected_devices_registry_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("connected_devices.json");

    let mut registry = ConnectedDevices::new();
    registry.push_back_device(ConnectedDevice::new(
        Descriptions::new("PFU", "HHKB-Classic"),
        DeviceIdentifiers::keyboard(0x04fe, 0x0021),
        false,
        false,
    ));
    registry.push_back_device(ConnectedDevice::new(
        Descriptions::new("Apple", "Magic Trackpad"),
        DeviceIdentifiers::pointing_device(0x05ac, 0x0265),
        false,
        true,
    ));
    // Duplicate arrival is ignored.
    registry.push_back_device(ConnectedDevice::new(
        Descriptions::new("PFU", "HHKB-Classic"),
        DeviceIdentifiers::keyboard(0x04fe, 0x0021),
        false,
        false,
    ));
    assert_eq!(registry.devices().len(), 2);

    registry.async_save_to_file(&path).join().unwrap();

    let reloaded = ConnectedDevices::load(&path);
    assert!(reloaded.loaded());
    assert_eq!(reloaded.devices(), registry.devices());
}
