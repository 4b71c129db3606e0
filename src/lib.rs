//! remapd configuration core - document model and rule compilation for a
//! keyboard/mouse event remapping daemon.
//!
//! This library exposes the configuration layer of the `remapd` daemon for
//! use by the management CLI and in tests.
//!
//! # Modules
//!
//! - `config`: The configuration document and its stores
//! - `connected_devices`: Registry of previously observed devices
//! - `manipulator`: Manipulator/condition construction and linting
//! - `error`: Error types with path-qualified messages
//! - `json`: jsonc parsing and atomic saves
//! - `paths`: Well-known file locations
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod connected_devices;
pub mod error;
pub mod json;
pub mod logging;
pub mod manipulator;
pub mod paths;

pub use config::ConfigDocument;
pub use connected_devices::ConnectedDevices;
pub use error::{ConfigError, Result};
