//! A named collection of remapping settings.
//!
//! Profiles are selected by name from the menu, so names need not be
//! unique; exactly-one-selected is enforced by the enclosing document.

use serde_json::{json, Map, Value};

use crate::config::complex_modifications::ComplexModifications;
use crate::config::device::{DeviceEntry, DeviceIdentifiers};
use crate::config::parameters::{Parameters, PROFILE_PARAMETERS};
use crate::config::simple_modifications::SimpleModifications;
use crate::config::virtual_hid_keyboard::VirtualHidKeyboard;
use crate::error::Result;
use crate::json as json_util;

/// Platform default media mappings for the function key row.
fn default_fn_function_keys() -> Value {
    json!([
        {"from": {"key_code": "f1"}, "to": [{"consumer_key_code": "display_brightness_decrement"}]},
        {"from": {"key_code": "f2"}, "to": [{"consumer_key_code": "display_brightness_increment"}]},
        {"from": {"key_code": "f3"}, "to": [{"apple_vendor_keyboard_key_code": "mission_control"}]},
        {"from": {"key_code": "f4"}, "to": [{"apple_vendor_keyboard_key_code": "spotlight"}]},
        {"from": {"key_code": "f5"}, "to": [{"consumer_key_code": "dictation"}]},
        {"from": {"key_code": "f6"}, "to": [{"key_code": "f6"}]},
        {"from": {"key_code": "f7"}, "to": [{"consumer_key_code": "rewind"}]},
        {"from": {"key_code": "f8"}, "to": [{"consumer_key_code": "play_or_pause"}]},
        {"from": {"key_code": "f9"}, "to": [{"consumer_key_code": "fast_forward"}]},
        {"from": {"key_code": "f10"}, "to": [{"consumer_key_code": "mute"}]},
        {"from": {"key_code": "f11"}, "to": [{"consumer_key_code": "volume_decrement"}]},
        {"from": {"key_code": "f12"}, "to": [{"consumer_key_code": "volume_increment"}]},
    ])
}

#[derive(Debug, Clone)]
pub struct Profile {
    json: Value,
    name: String,
    selected: bool,
    parameters: Parameters,
    simple_modifications: SimpleModifications,
    fn_function_keys: SimpleModifications,
    complex_modifications: ComplexModifications,
    virtual_hid_keyboard: VirtualHidKeyboard,
    devices: Vec<DeviceEntry>,
}

impl Profile {
    pub fn new(value: &Value) -> Result<Self> {
        let object = json_util::requires_object(value, "`profiles` entry")?;

        let mut fn_function_keys = SimpleModifications::new();
        fn_function_keys.update(&default_fn_function_keys());

        let mut profile = Self {
            json: value.clone(),
            name: String::new(),
            selected: false,
            parameters: Parameters::new(PROFILE_PARAMETERS),
            simple_modifications: SimpleModifications::new(),
            fn_function_keys,
            complex_modifications: ComplexModifications::default(),
            virtual_hid_keyboard: VirtualHidKeyboard::default(),
            devices: Vec::new(),
        };

        if let Some(v) = object.get("name") {
            profile.name = json_util::requires_string(v, "`name`")?.to_string();
        }
        profile.selected = json_util::find_bool(value, "selected").unwrap_or(false);

        if let Some(v) = object.get("parameters") {
            profile.parameters.update(v)?;
        }
        if let Some(v) = object.get("simple_modifications") {
            profile.simple_modifications.update(v);
        }
        if let Some(v) = object.get("fn_function_keys") {
            profile.fn_function_keys.update(v);
        }
        if let Some(v) = object.get("complex_modifications") {
            profile.complex_modifications =
                ComplexModifications::new(v).map_err(|e| e.in_key("complex_modifications"))?;
        }
        if let Some(v) = object.get("virtual_hid_keyboard") {
            profile.virtual_hid_keyboard =
                VirtualHidKeyboard::new(v).map_err(|e| e.in_key("virtual_hid_keyboard"))?;
        }
        if let Some(v) = object.get("devices") {
            let entries = json_util::requires_array(v, "`devices`")?;
            for entry in entries {
                profile
                    .devices
                    .push(DeviceEntry::new(entry).map_err(|e| e.in_key("devices"))?);
            }
        }

        Ok(profile)
    }

    /// A fresh profile with the given name and nothing configured.
    #[must_use]
    pub fn with_name(name: impl Into<String>) -> Self {
        let mut fn_function_keys = SimpleModifications::new();
        fn_function_keys.update(&default_fn_function_keys());

        Self {
            json: Value::Object(Map::new()),
            name: name.into(),
            selected: false,
            parameters: Parameters::new(PROFILE_PARAMETERS),
            simple_modifications: SimpleModifications::new(),
            fn_function_keys,
            complex_modifications: ComplexModifications::default(),
            virtual_hid_keyboard: VirtualHidKeyboard::default(),
            devices: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, value: bool) {
        self.selected = value;
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    #[must_use]
    pub fn simple_modifications(&self) -> &SimpleModifications {
        &self.simple_modifications
    }

    pub fn simple_modifications_mut(&mut self) -> &mut SimpleModifications {
        &mut self.simple_modifications
    }

    #[must_use]
    pub fn fn_function_keys(&self) -> &SimpleModifications {
        &self.fn_function_keys
    }

    pub fn fn_function_keys_mut(&mut self) -> &mut SimpleModifications {
        &mut self.fn_function_keys
    }

    #[must_use]
    pub fn complex_modifications(&self) -> &ComplexModifications {
        &self.complex_modifications
    }

    pub fn complex_modifications_mut(&mut self) -> &mut ComplexModifications {
        &mut self.complex_modifications
    }

    #[must_use]
    pub fn virtual_hid_keyboard(&self) -> &VirtualHidKeyboard {
        &self.virtual_hid_keyboard
    }

    pub fn virtual_hid_keyboard_mut(&mut self) -> &mut VirtualHidKeyboard {
        &mut self.virtual_hid_keyboard
    }

    #[must_use]
    pub fn devices(&self) -> &[DeviceEntry] {
        &self.devices
    }

    /// Read-only probe: the entry for `identifiers`, or a synthesized
    /// default entry. Never inserts, so asking about a device leaves the
    /// document unchanged.
    #[must_use]
    pub fn device(&self, identifiers: &DeviceIdentifiers) -> DeviceEntry {
        self.devices
            .iter()
            .find(|d| d.identifiers() == identifiers)
            .cloned()
            .unwrap_or_else(|| DeviceEntry::with_identifiers(identifiers.clone()))
    }

    /// Mutator access: inserts a default entry for `identifiers` first if
    /// none exists yet.
    pub fn device_mut(&mut self, identifiers: &DeviceIdentifiers) -> &mut DeviceEntry {
        if !self.devices.iter().any(|d| d.identifiers() == identifiers) {
            self.devices
                .push(DeviceEntry::with_identifiers(identifiers.clone()));
        }
        let index = self
            .devices
            .iter()
            .position(|d| d.identifiers() == identifiers)
            .unwrap_or(0);
        &mut self.devices[index]
    }

    /// Probe for a device-scoped simple modification store.
    #[must_use]
    pub fn find_simple_modifications(
        &self,
        identifiers: &DeviceIdentifiers,
    ) -> Option<&SimpleModifications> {
        self.devices
            .iter()
            .find(|d| d.identifiers() == identifiers)
            .map(DeviceEntry::simple_modifications)
    }

    pub fn find_simple_modifications_mut(
        &mut self,
        identifiers: &DeviceIdentifiers,
    ) -> &mut SimpleModifications {
        self.device_mut(identifiers).simple_modifications_mut()
    }

    /// Probe for a device-scoped fn-function-key store.
    #[must_use]
    pub fn find_fn_function_keys(
        &self,
        identifiers: &DeviceIdentifiers,
    ) -> Option<&SimpleModifications> {
        self.devices
            .iter()
            .find(|d| d.identifiers() == identifiers)
            .map(DeviceEntry::fn_function_keys)
    }

    pub fn find_fn_function_keys_mut(
        &mut self,
        identifiers: &DeviceIdentifiers,
    ) -> &mut SimpleModifications {
        self.device_mut(identifiers).fn_function_keys_mut()
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = match &self.json {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        object.insert("name".to_string(), Value::from(self.name.clone()));
        object.insert("selected".to_string(), Value::Bool(self.selected));

        let parameters = self.parameters.to_json();
        if parameters.as_object().is_some_and(Map::is_empty) {
            object.remove("parameters");
        } else {
            object.insert("parameters".to_string(), parameters);
        }

        let simple = self.simple_modifications.to_json();
        if simple.as_array().is_some_and(Vec::is_empty) {
            object.remove("simple_modifications");
        } else {
            object.insert("simple_modifications".to_string(), simple);
        }

        // The seeded defaults are always written out so the document shows
        // the complete fn row.
        object.insert("fn_function_keys".to_string(), self.fn_function_keys.to_json());

        let complex = self.complex_modifications.to_json();
        if complex.as_object().is_some_and(Map::is_empty) {
            object.remove("complex_modifications");
        } else {
            object.insert("complex_modifications".to_string(), complex);
        }

        let keyboard = self.virtual_hid_keyboard.to_json();
        if keyboard.as_object().is_some_and(Map::is_empty) {
            object.remove("virtual_hid_keyboard");
        } else {
            object.insert("virtual_hid_keyboard".to_string(), keyboard);
        }

        if self.devices.is_empty() {
            object.remove("devices");
        } else {
            object.insert(
                "devices".to_string(),
                Value::Array(self.devices.iter().map(DeviceEntry::to_json).collect()),
            );
        }

        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile() {
        let p = Profile::new(&json!({})).unwrap();
        assert_eq!(p.name(), "");
        assert!(!p.selected());
        assert!(p.simple_modifications().pairs().is_empty());
        assert!(p.devices().is_empty());
    }

    #[test]
    fn test_fn_function_keys_are_seeded() {
        let p = Profile::with_name("Default profile");
        assert_eq!(p.fn_function_keys().pairs().len(), 12);

        let f1 = p
            .fn_function_keys()
            .pairs()
            .iter()
            .find(|pair| pair.from_value() == &json!({"key_code": "f1"}))
            .unwrap();
        assert_eq!(
            f1.to_value(),
            &json!([{"consumer_key_code": "display_brightness_decrement"}])
        );
    }

    #[test]
    fn test_fn_function_keys_user_override_replaces_seeded_to() {
        let p = Profile::new(&json!({
            "name": "Test",
            "fn_function_keys": [
                {"from": {"key_code": "f1"}, "to": [{"key_code": "f1"}]},
            ],
        }))
        .unwrap();

        assert_eq!(p.fn_function_keys().pairs().len(), 12);
        let f1 = p
            .fn_function_keys()
            .pairs()
            .iter()
            .find(|pair| pair.from_value() == &json!({"key_code": "f1"}))
            .unwrap();
        assert_eq!(f1.to_value(), &json!([{"key_code": "f1"}]));
    }

    #[test]
    fn test_device_probe_does_not_insert() {
        let p = Profile::with_name("Test");
        let identifiers = DeviceIdentifiers::pointing_device(0x046d, 0xc52b);

        let entry = p.device(&identifiers);
        assert!(entry.ignore());
        assert!(p.devices().is_empty());
    }

    #[test]
    fn test_device_mut_inserts_lazily() {
        let mut p = Profile::with_name("Test");
        let identifiers = DeviceIdentifiers::keyboard(0x05ac, 0x024f);

        p.device_mut(&identifiers).set_ignore(true);
        assert_eq!(p.devices().len(), 1);
        assert!(p.device(&identifiers).ignore());

        // A second mutation reuses the entry.
        p.device_mut(&identifiers).set_manipulate_caps_lock_led(false);
        assert_eq!(p.devices().len(), 1);
    }

    #[test]
    fn test_find_simple_modifications_probe_and_mutator() {
        let mut p = Profile::with_name("Test");
        let identifiers = DeviceIdentifiers::keyboard(0x05ac, 0x024f);

        assert!(p.find_simple_modifications(&identifiers).is_none());

        p.find_simple_modifications_mut(&identifiers)
            .update(&json!([{"from": {"key_code": "a"}, "to": [{"key_code": "b"}]}]));

        assert_eq!(
            p.find_simple_modifications(&identifiers).unwrap().pairs().len(),
            1
        );
    }

    #[test]
    fn test_nested_error_is_wrapped_with_profile_key() {
        let err = Profile::new(&json!({
            "complex_modifications": {"rules": [{"manipulators": []}]},
        }))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "`complex_modifications` error: `rules` error: `manipulators` must not be empty"
        );
    }

    #[test]
    fn test_to_json_round_trip_preserves_unknown_keys() {
        let input = json!({
            "name": "Default profile",
            "selected": true,
            "future_key": [1, 2, 3],
            "simple_modifications": [
                {"from": {"key_code": "caps_lock"}, "to": [{"key_code": "escape"}]},
            ],
        });
        let p = Profile::new(&input).unwrap();
        let output = p.to_json();

        assert_eq!(output["name"], json!("Default profile"));
        assert_eq!(output["selected"], json!(true));
        assert_eq!(output["future_key"], json!([1, 2, 3]));
        assert_eq!(
            output["simple_modifications"],
            json!([{"from": {"key_code": "caps_lock"}, "to": [{"key_code": "escape"}]}])
        );
        // The seeded fn row is part of the document.
        assert_eq!(output["fn_function_keys"].as_array().unwrap().len(), 12);
    }
}
