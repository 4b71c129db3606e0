//! Well-known file locations for the daemon's user configuration.

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// The user configuration directory (e.g. `~/.config/remapd`).
pub fn user_configuration_directory() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("remapd"))
        .ok_or(ConfigError::NoConfigDirectory)
}

/// The main configuration document.
pub fn user_configuration_file() -> Result<PathBuf> {
    Ok(user_configuration_directory()?.join("remapd.json"))
}

/// Directory holding dated automatic backups of the configuration document.
pub fn automatic_backups_directory() -> Result<PathBuf> {
    Ok(user_configuration_directory()?.join("automatic_backups"))
}

/// Directory holding user-installed complex-modification asset bundles.
pub fn user_assets_directory() -> Result<PathBuf> {
    Ok(user_configuration_directory()?
        .join("assets")
        .join("complex_modifications"))
}

/// The persisted registry of previously observed devices.
pub fn connected_devices_file() -> Result<PathBuf> {
    Ok(user_configuration_directory()?.join("connected_devices.json"))
}
