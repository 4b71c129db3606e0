//! The registry of devices the daemon has observed.
//!
//! The daemon rewrites this file whenever a device appears, and the UI reads
//! it to offer per-device settings for keyboards that are currently
//! unplugged. Unlike the configuration document, this file is machine
//! generated, so there is no overlay to preserve.

use std::path::{Path, PathBuf};
use std::thread;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::config::device::DeviceIdentifiers;
use crate::error::Result;
use crate::json;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptions {
    #[serde(default)]
    manufacturer: String,
    #[serde(default)]
    product: String,
}

impl Descriptions {
    #[must_use]
    pub fn new(manufacturer: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            product: product.into(),
        }
    }

    #[must_use]
    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    #[must_use]
    pub fn product(&self) -> &str {
        &self.product
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedDevice {
    #[serde(default)]
    descriptions: Descriptions,
    #[serde(default)]
    identifiers: DeviceIdentifiers,
    #[serde(default)]
    is_built_in_keyboard: bool,
    #[serde(default)]
    is_built_in_trackpad: bool,
}

impl ConnectedDevice {
    #[must_use]
    pub fn new(
        descriptions: Descriptions,
        identifiers: DeviceIdentifiers,
        is_built_in_keyboard: bool,
        is_built_in_trackpad: bool,
    ) -> Self {
        Self {
            descriptions,
            identifiers,
            is_built_in_keyboard,
            is_built_in_trackpad,
        }
    }

    #[must_use]
    pub fn descriptions(&self) -> &Descriptions {
        &self.descriptions
    }

    #[must_use]
    pub fn identifiers(&self) -> &DeviceIdentifiers {
        &self.identifiers
    }

    #[must_use]
    pub fn is_built_in_keyboard(&self) -> bool {
        self.is_built_in_keyboard
    }

    #[must_use]
    pub fn is_built_in_trackpad(&self) -> bool {
        self.is_built_in_trackpad
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConnectedDevices {
    devices: Vec<ConnectedDevice>,
    loaded: bool,
}

impl ConnectedDevices {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `path`, falling back to an empty registry on any problem.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(devices) => devices,
            Err(e) => {
                error!("failed to load {}: {e}", path.display());
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let value = json::parse_jsonc(&text)?;
        let devices: Vec<ConnectedDevice> = serde_json::from_value(value)?;

        let mut registry = Self {
            devices: Vec::new(),
            loaded: true,
        };
        for device in devices {
            registry.push_back_device(device);
        }
        Ok(registry)
    }

    #[must_use]
    pub fn loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn devices(&self) -> &[ConnectedDevice] {
        &self.devices
    }

    /// Inserts `device` unless one with the same identifiers is already
    /// present, keeping the list sorted for stable UI display.
    pub fn push_back_device(&mut self, device: ConnectedDevice) {
        if self
            .devices
            .iter()
            .any(|d| d.identifiers() == device.identifiers())
        {
            return;
        }

        self.devices.push(device);
        self.devices.sort_by_key(|d| {
            (
                d.descriptions.product.clone(),
                d.descriptions.manufacturer.clone(),
                !d.identifiers.is_keyboard,
                !d.identifiers.is_pointing_device,
            )
        });
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.devices).unwrap_or(Value::Array(Vec::new()))
    }

    pub fn sync_save_to_file(&self, path: &Path) -> Result<()> {
        json::sync_save_to_file(&self.to_json(), path, 0o700, 0o600)
    }

    /// Hands the serialized registry to a background writer thread. Device
    /// arrival callbacks must not block on disk.
    pub fn async_save_to_file(&self, path: &Path) -> thread::JoinHandle<()> {
        let value = self.to_json();
        let path: PathBuf = path.to_path_buf();

        thread::spawn(move || {
            if let Err(e) = json::sync_save_to_file(&value, &path, 0o700, 0o600) {
                error!("failed to save {}: {e}", path.display());
            }
        })
    }
}
