//! # stt-settings
//!
//! Configuration for `stt-nemo`, loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`SttSettings::default()`]
//! 2. **User file**: `~/.config/stt-nemo/settings.json` or `$STT_NEMO_SETTINGS`
//!    (deep-merged over defaults)
//! 3. **Environment variables**: `STT_NEMO_*` overrides (highest priority)
//!
//! Command-line flags are applied on top by the binary.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
