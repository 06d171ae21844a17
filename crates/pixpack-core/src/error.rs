//! Error types for pixpack

use thiserror::Error;

/// The main error type for pixpack operations
#[derive(Debug, Error)]
pub enum PixpackError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    #[error("Corrupt metadata in {entry}: {reason}")]
    CorruptMetadata { entry: String, reason: String },

    #[error("Additional metadata entry ignored: {0}")]
    DuplicateMetadata(String),

    #[error("Entry name cannot be stored or archived: {0}")]
    UnsafeEntryName(String),

    #[error("No source selected")]
    NoSourceSelected,

    #[error("No bytes available from {0}")]
    NoBytesAvailable(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

impl PixpackError {
    /// True for the "user backed out" outcomes that return to idle silently
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            PixpackError::NoSourceSelected | PixpackError::NoBytesAvailable(_)
        )
    }
}

/// Result type alias for pixpack operations
pub type Result<T> = std::result::Result<T, PixpackError>;

impl From<toml::de::Error> for PixpackError {
    fn from(err: toml::de::Error) -> Self {
        PixpackError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for PixpackError {
    fn from(err: toml::ser::Error) -> Self {
        PixpackError::TomlSerError(err.to_string())
    }
}
