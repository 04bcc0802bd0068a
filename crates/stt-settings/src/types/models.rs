//! Model cache location and download source settings.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stt_core::Language;

/// Where exported models live and how they get there.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSettings {
    /// Root of the model cache (may start with `~/`). Each model lives in
    /// `<cacheDir>/<model id>/`.
    pub cache_dir: String,
    /// Fetch missing model files from `HuggingFace`.
    pub auto_download: bool,
    /// Language used when none is given on the command line.
    pub default_language: Language,
    /// Per-language `HuggingFace` repo holding the three-file ONNX export,
    /// keyed by language code. The published `nvidia/*` checkpoints ship only
    /// a `.nemo` archive, so nothing is downloaded for a language without an
    /// entry here.
    pub repos: BTreeMap<String, String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            cache_dir: "~/.cache/stt-nemo/models".to_string(),
            auto_download: true,
            default_language: Language::default(),
            repos: BTreeMap::new(),
        }
    }
}

impl ModelSettings {
    /// Cache directory with a leading `~/` expanded to `$HOME`.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        if let Some(rest) = self.cache_dir.strip_prefix("~/") {
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home).join(rest);
            }
        }
        PathBuf::from(&self.cache_dir)
    }

    /// Directory holding the export for `language`.
    pub fn model_dir(&self, language: Language) -> PathBuf {
        self.resolved_cache_dir().join(language.model_id())
    }

    /// `HuggingFace` repo to download `language`'s export from, if configured.
    pub fn repo_for(&self, language: Language) -> Option<&str> {
        self.repos
            .get(language.code())
            .map(String::as_str)
            .filter(|repo| !repo.trim().is_empty())
    }
}
