//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`SttSettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use stt_core::Language;
use tracing::debug;

use crate::errors::Result;
use crate::types::{Backend, LogLevel, MAX_THREADS, MIN_THREADS, SttSettings};

/// Environment variable naming an alternate settings file.
pub const SETTINGS_ENV: &str = "STT_NEMO_SETTINGS";

/// Resolve the settings file path.
///
/// `$STT_NEMO_SETTINGS` when set, otherwise `~/.config/stt-nemo/settings.json`.
pub fn settings_path() -> PathBuf {
    if let Some(path) = read_env_string(SETTINGS_ENV) {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("stt-nemo")
        .join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<SttSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or the merged result fails validation, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<SttSettings> {
    let defaults = serde_json::to_value(SttSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: SttSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `STT_NEMO_*` environment variable overrides.
///
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_env_overrides(settings: &mut SttSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup` instead of the process environment.
fn apply_overrides(settings: &mut SttSettings, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── Models ──────────────────────────────────────────────────────
    if let Some(v) = get("STT_NEMO_CACHE_DIR") {
        settings.models.cache_dir = v;
    }
    if let Some(v) = get("STT_NEMO_AUTO_DOWNLOAD") {
        match parse_bool(&v) {
            Some(b) => settings.models.auto_download = b,
            None => warn_invalid("STT_NEMO_AUTO_DOWNLOAD", &v),
        }
    }
    if let Some(v) = get("STT_NEMO_DEFAULT_LANG") {
        match v.parse::<Language>() {
            Ok(lang) => settings.models.default_language = lang,
            Err(_) => warn_invalid("STT_NEMO_DEFAULT_LANG", &v),
        }
    }

    // ── Inference ───────────────────────────────────────────────────
    if let Some(v) = get("STT_NEMO_BACKEND") {
        match parse_enum::<Backend>(&v) {
            Some(b) => settings.inference.backend = b,
            None => warn_invalid("STT_NEMO_BACKEND", &v),
        }
    }
    if let Some(v) = get("STT_NEMO_THREADS") {
        match parse_usize_range(&v, MIN_THREADS, MAX_THREADS) {
            Some(n) => settings.inference.intra_threads = n,
            None => warn_invalid("STT_NEMO_THREADS", &v),
        }
    }
    if let Some(v) = get("STT_NEMO_COMMAND") {
        settings.inference.command.program = v;
    }
    if let Some(v) = get("STT_NEMO_COMMAND_TIMEOUT_MS") {
        match parse_u64_range(&v, 1000, 86_400_000) {
            Some(n) => settings.inference.command.timeout_ms = n,
            None => warn_invalid("STT_NEMO_COMMAND_TIMEOUT_MS", &v),
        }
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = get("STT_NEMO_LOG_LEVEL") {
        match parse_enum::<LogLevel>(&v) {
            Some(level) => settings.logging.level = level,
            None => warn_invalid("STT_NEMO_LOG_LEVEL", &v),
        }
    }
}

fn warn_invalid(key: &str, value: &str) {
    tracing::warn!(key, value, "invalid env var, ignoring");
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a lowercase serde enum tag.
fn parse_enum<T: serde::de::DeserializeOwned>(val: &str) -> Option<T> {
    serde_json::from_value(Value::String(val.to_lowercase())).ok()
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"models": {"cacheDir": "/a", "autoDownload": true}});
        let source = serde_json::json!({"models": {"cacheDir": "/b"}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["models"]["cacheDir"], "/b");
        assert_eq!(merged["models"]["autoDownload"], true);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"args": ["{audio}", "--lang", "{lang}"]});
        let source = serde_json::json!({"args": ["{audio}"]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["args"], serde_json::json!(["{audio}"]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 42);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let path = Path::new("/nonexistent/settings.json");
        let settings = load_settings_from_path(path).unwrap();
        let defaults = SttSettings::default();
        assert_eq!(settings.version, defaults.version);
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"models": {"defaultLanguage": "ka", "repos": {"ka": "me/ka-onnx"}}, "logging": {"level": "warn"}}"#,
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.models.default_language, Language::Ka);
        assert_eq!(settings.models.repo_for(Language::Ka), Some("me/ka-onnx"));
        assert_eq!(settings.logging.level, LogLevel::Warn);
        assert!(settings.models.auto_download);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result, Err(SettingsError::Json(_))));
    }

    #[test]
    fn load_unknown_language_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"models": {"defaultLanguage": "fr"}}"#).unwrap();

        assert!(matches!(
            load_settings_from_path(&path),
            Err(SettingsError::Json(_))
        ));
    }

    #[test]
    fn load_command_backend_without_program_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"inference": {"backend": "command"}}"#).unwrap();

        assert!(matches!(
            load_settings_from_path(&path),
            Err(SettingsError::InvalidValue(_))
        ));
    }

    // ── env overrides ───────────────────────────────────────────────

    #[test]
    fn overrides_apply_valid_values() {
        let mut settings = SttSettings::default();
        apply_overrides(
            &mut settings,
            lookup_from(&[
                ("STT_NEMO_CACHE_DIR", "/srv/models"),
                ("STT_NEMO_AUTO_DOWNLOAD", "no"),
                ("STT_NEMO_DEFAULT_LANG", "KA"),
                ("STT_NEMO_BACKEND", "Command"),
                ("STT_NEMO_THREADS", "8"),
                ("STT_NEMO_COMMAND", "/usr/local/bin/stt-py"),
                ("STT_NEMO_COMMAND_TIMEOUT_MS", "5000"),
                ("STT_NEMO_LOG_LEVEL", "debug"),
            ]),
        );
        assert_eq!(settings.models.cache_dir, "/srv/models");
        assert!(!settings.models.auto_download);
        assert_eq!(settings.models.default_language, Language::Ka);
        assert_eq!(settings.inference.backend, Backend::Command);
        assert_eq!(settings.inference.intra_threads, 8);
        assert_eq!(settings.inference.command.program, "/usr/local/bin/stt-py");
        assert_eq!(settings.inference.command.timeout_ms, 5000);
        assert_eq!(settings.logging.level, LogLevel::Debug);
    }

    #[test]
    fn overrides_ignore_invalid_values() {
        let mut settings = SttSettings::default();
        apply_overrides(
            &mut settings,
            lookup_from(&[
                ("STT_NEMO_AUTO_DOWNLOAD", "maybe"),
                ("STT_NEMO_DEFAULT_LANG", "fr"),
                ("STT_NEMO_BACKEND", "gpu"),
                ("STT_NEMO_THREADS", "0"),
                ("STT_NEMO_COMMAND_TIMEOUT_MS", "5"),
                ("STT_NEMO_LOG_LEVEL", "loud"),
            ]),
        );
        let defaults = SttSettings::default();
        assert_eq!(settings.models.auto_download, defaults.models.auto_download);
        assert_eq!(settings.models.default_language, Language::En);
        assert_eq!(settings.inference.backend, Backend::Onnx);
        assert_eq!(settings.inference.intra_threads, 4);
        assert_eq!(settings.inference.command.timeout_ms, 600_000);
        assert_eq!(settings.logging.level, LogLevel::Off);
    }

    #[test]
    fn overrides_skip_empty_values() {
        let mut settings = SttSettings::default();
        apply_overrides(&mut settings, lookup_from(&[("STT_NEMO_CACHE_DIR", "")]));
        assert_eq!(settings.models.cache_dir, "~/.cache/stt-nemo/models");
    }

    #[test]
    fn invalid_override_is_logged() {
        let (logs, _guard) = stt_core::logging::capture_logs();
        let mut settings = SttSettings::default();
        apply_overrides(&mut settings, lookup_from(&[("STT_NEMO_THREADS", "999")]));
        assert!(logs.has_event(tracing::Level::WARN, "invalid env var"));
    }

    // ── parsers ─────────────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for val in &["true", "1", "yes", "on", "TRUE", "Yes", "ON"] {
            assert_eq!(parse_bool(val), Some(true), "failed for {val}");
        }
        for val in &["false", "0", "no", "off", "FALSE", "No", "OFF"] {
            assert_eq!(parse_bool(val), Some(false), "failed for {val}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_usize_range("4", 1, 64), Some(4));
        assert_eq!(parse_usize_range("0", 1, 64), None);
        assert_eq!(parse_usize_range("65", 1, 64), None);
        assert_eq!(parse_u64_range("30000", 1000, 600_000), Some(30_000));
        assert_eq!(parse_u64_range("abc", 1000, 600_000), None);
    }
}
