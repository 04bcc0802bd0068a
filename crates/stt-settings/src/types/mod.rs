//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` for the JSON file
//! format. Each type implements [`Default`] with production default values
//! and is marked `#[serde(default)]`, so partial JSON is accepted.

mod inference;
mod logging;
mod models;

pub use inference::*;
pub use logging::*;
pub use models::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// # JSON Format
///
/// ```json
/// {
///   "models": { "cacheDir": "/opt/stt/models", "autoDownload": false },
///   "inference": { "backend": "command", "command": { "program": "stt-py" } },
///   "logging": { "level": "warn" }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SttSettings {
    /// Settings schema version.
    pub version: String,
    /// Model location and download behavior.
    pub models: ModelSettings,
    /// Backend selection and tuning.
    pub inference: InferenceSettings,
    /// Diagnostic output.
    pub logging: LoggingSettings,
}

impl Default for SttSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            models: ModelSettings::default(),
            inference: InferenceSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl SttSettings {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_THREADS..=MAX_THREADS).contains(&self.inference.intra_threads) {
            return Err(SettingsError::InvalidValue(format!(
                "inference.intraThreads must be within {MIN_THREADS}..={MAX_THREADS}, got {}",
                self.inference.intra_threads
            )));
        }
        if self.inference.backend == Backend::Command
            && self.inference.command.program.trim().is_empty()
        {
            return Err(SettingsError::InvalidValue(
                "inference.command.program is required for the command backend".to_string(),
            ));
        }
        if self.models.cache_dir.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "models.cacheDir must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
