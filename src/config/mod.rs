//! Configuration document model.
//!
//! The document is a JSON tree the user also edits by hand, so every store
//! keeps the subtree it was built from and re-renders onto it when saving;
//! keys this version does not understand round-trip untouched.

pub mod assets;
pub mod complex_modifications;
pub mod device;
pub mod document;
pub mod global;
pub mod machine_specific;
pub mod parameters;
pub mod profile;
pub mod simple_modifications;
pub mod virtual_hid_keyboard;

pub use complex_modifications::{ComplexModifications, Rule};
pub use device::{DeviceEntry, DeviceIdentifiers};
pub use document::ConfigDocument;
pub use global::GlobalConfiguration;
pub use parameters::Parameters;
pub use profile::Profile;
pub use simple_modifications::SimpleModifications;
pub use virtual_hid_keyboard::VirtualHidKeyboard;
