//! Error types for keyframe-scanner

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ScannerError>;

/// Errors raised while processing scans.
///
/// None of these are fatal to a replay loop: a rejected scan produces no
/// record and the next scan is processed normally.
#[derive(Error, Debug)]
pub enum ScannerError {
    /// Scan cannot be registered (empty, no valid ranges, empty cloud)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scan log or record (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration loading and validation errors.
///
/// Raised at startup only; a running engine never sees them.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value violates a startup invariant
    #[error("Invalid config value for {field}: {reason}")]
    Invalid {
        /// Option name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
