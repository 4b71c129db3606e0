//! Error types for configuration loading and rule compilation.

use thiserror::Error;

/// Primary error type for configuration operations.
///
/// Structural document loading is fail-soft and never surfaces these to the
/// caller (see `ConfigDocument::load`); semantic rule construction raises
/// `Unmarshal` with a path-qualified message chain.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A recognized JSON key had the wrong type, or a mandatory key was
    /// missing. The message reads as a path when errors are re-wrapped by
    /// enclosing keys (e.g. "`manipulators` error: `type` is missing").
    #[error("{0}")]
    Unmarshal(String),

    /// Deleting an asset file outside the user assets directory was refused.
    #[error("{path} is not under the user assets directory")]
    OutsideAssetsDirectory { path: String },

    /// The user configuration directory could not be determined.
    #[error("Could not determine the user configuration directory")]
    NoConfigDirectory,

    /// JSON syntax error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Builds an `Unmarshal` error from a formatted message.
    pub fn unmarshal(message: impl Into<String>) -> Self {
        Self::Unmarshal(message.into())
    }

    /// Re-wraps an error with the enclosing key name so nested errors read
    /// as a path.
    pub fn in_key(self, key: &str) -> Self {
        Self::Unmarshal(format!("`{key}` error: {self}"))
    }
}

/// Convenience type alias for Results using ConfigError.
pub type Result<T> = std::result::Result<T, ConfigError>;
