//! Errors raised while loading `settings.json`.

use thiserror::Error;

/// Why the settings could not be loaded.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read stt-nemo settings file: {0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid JSON or has a field of the wrong type.
    #[error("stt-nemo settings file is not valid: {0}")]
    Json(#[from] serde_json::Error),
    /// The merged settings break a cross-field rule.
    #[error("invalid stt-nemo setting: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
