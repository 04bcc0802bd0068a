//! Model file management: path resolution and download from `HuggingFace`.
//!
//! Each language's export lives in its own directory (by default
//! `<cacheDir>/<model id>/`) and holds an ONNX preprocessor, the encoder with
//! its CTC head, and the token table.

use std::path::{Path, PathBuf};

use stt_core::Language;
use tracing::{debug, info, warn};

use crate::types::{ResultExt, TranscriptionError};

/// Typed paths for the required model files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    /// Mel-spectrogram preprocessor (`preprocessor.onnx`).
    pub preprocessor: PathBuf,
    /// Encoder + CTC head (`model.onnx`).
    pub model: PathBuf,
    /// Token vocabulary (`vocab.txt`).
    pub vocab: PathBuf,
}

impl ModelPaths {
    /// All required model filenames.
    pub const NAMES: &[&str] = &["preprocessor.onnx", "model.onnx", "vocab.txt"];

    /// Construct paths for all model files under `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            preprocessor: dir.join("preprocessor.onnx"),
            model: dir.join("model.onnx"),
            vocab: dir.join("vocab.txt"),
        }
    }

    /// Filenames not present under the directory.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (&self.preprocessor, Self::NAMES[0]),
            (&self.model, Self::NAMES[1]),
            (&self.vocab, Self::NAMES[2]),
        ]
        .into_iter()
        .filter(|(path, _)| !path.exists())
        .map(|(_, name)| name)
        .collect()
    }

    /// Check if all required files exist.
    pub fn all_exist(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Where to get a model and whether fetching is allowed.
#[derive(Debug, Clone)]
pub struct ModelSource {
    /// Language the export is for.
    pub language: Language,
    /// Local directory holding (or receiving) the export.
    pub dir: PathBuf,
    /// `HuggingFace` repo to fetch missing files from. `None` when no repo
    /// hosting an ONNX export is configured.
    pub repo: Option<String>,
    /// Fetch missing files instead of failing.
    pub allow_download: bool,
}

/// Make sure every model file is present, downloading if allowed.
pub async fn ensure_model(source: &ModelSource) -> Result<ModelPaths, TranscriptionError> {
    let paths = ModelPaths::from_dir(&source.dir);
    let missing = paths.missing();

    if missing.is_empty() {
        debug!("model files already cached at {}", source.dir.display());
        return Ok(paths);
    }

    if !source.allow_download {
        return Err(TranscriptionError::ModelNotAvailable(format!(
            "{} missing from {} and downloads are disabled",
            missing.join(", "),
            source.dir.display()
        )));
    }

    let Some(repo) = source.repo.clone() else {
        return Err(TranscriptionError::ModelNotAvailable(format!(
            "{} missing from {} and no ONNX export repo is configured for '{}'; \
             set models.repos.{} in the settings file, place the export there by hand, \
             or use the command backend (--backend command)",
            missing.join(", "),
            source.dir.display(),
            source.language,
            source.language.code()
        )));
    };

    info!(%repo, "downloading model files from HuggingFace...");
    std::fs::create_dir_all(&source.dir)?;

    // hf-hub uses sync HTTP
    let dir = source.dir.clone();
    tokio::task::spawn_blocking(move || download_model_files(&dir, &repo))
        .await
        .model("task join")??;

    Ok(paths)
}

fn download_model_files(model_dir: &Path, repo_id: &str) -> Result<(), TranscriptionError> {
    let api = hf_hub::api::sync::ApiBuilder::new()
        .with_progress(false)
        .build()
        .model("HF API init")?;
    let repo = api.model(repo_id.to_string());

    for &filename in ModelPaths::NAMES {
        let target = model_dir.join(filename);
        if target.exists() {
            debug!("skipping {filename} (already exists)");
            continue;
        }

        info!("downloading {filename}...");
        match repo.get(filename) {
            Ok(cached_path) => {
                // hf-hub caches to its own dir; copy to our model dir
                if cached_path != target {
                    let _ = std::fs::copy(&cached_path, &target)
                        .model(&format!("copy {filename}"))?;
                }
                debug!("downloaded {filename}");
            }
            Err(e) => {
                warn!("failed to download {filename}: {e}");
                return Err(TranscriptionError::ModelNotAvailable(format!(
                    "download failed for {filename} from {repo_id}: {e}"
                )));
            }
        }
    }

    info!("all model files ready at {}", model_dir.display());
    Ok(())
}
