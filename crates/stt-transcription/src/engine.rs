//! ONNX session management and inference pipeline.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::logging::LogLevel;
use ort::session::Session;
use stt_core::{Hypothesis, Language, TranscriptionRequest};
use tracing::{debug, info};

use crate::audio;
use crate::decoder;
use crate::model::ModelPaths;
use crate::transcriber::{BackendOutput, Transcriber};
use crate::types::{ResultExt, TranscriptionError};
use crate::vocab::Vocabulary;

/// How to build the ONNX sessions.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Intra-op thread count for both sessions.
    pub intra_threads: usize,
    /// Raise ONNX Runtime's own log threshold to fatal.
    pub quiet: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            intra_threads: 4,
            quiet: true,
        }
    }
}

struct Sessions {
    preprocessor: Mutex<Session>,
    model: Mutex<Session>,
    vocab: Vocabulary,
}

/// In-process transcription with an exported FastConformer hybrid model.
///
/// Holds the preprocessor and encoder/CTC sessions plus the vocabulary for one
/// language. Sessions are behind `Mutex` since `Session::run` requires
/// `&mut self`; all CPU work runs on `spawn_blocking`.
pub struct OnnxTranscriber {
    sessions: Arc<Sessions>,
    language: Language,
}

impl OnnxTranscriber {
    /// Load the sessions for `language` from `paths`.
    ///
    /// CPU- and I/O-heavy; runs on the blocking pool.
    pub async fn load(
        language: Language,
        paths: ModelPaths,
        options: EngineOptions,
    ) -> Result<Self, TranscriptionError> {
        let sessions = tokio::task::spawn_blocking(move || load_sessions(&paths, options))
            .await
            .inference("task join")??;
        Ok(Self {
            sessions: Arc::new(sessions),
            language,
        })
    }
}

fn build_session(path: &Path, options: EngineOptions) -> Result<Session, TranscriptionError> {
    let log_level = if options.quiet {
        LogLevel::Fatal
    } else {
        LogLevel::Warning
    };
    Session::builder()
        .inference("session builder")?
        .with_intra_threads(options.intra_threads)
        .inference("set threads")?
        .with_log_level(log_level)
        .inference("set log level")?
        .commit_from_file(path)
        .inference(&format!("load {}", path.display()))
}

fn load_sessions(paths: &ModelPaths, options: EngineOptions) -> Result<Sessions, TranscriptionError> {
    info!(
        "loading transcription model from {}...",
        paths.model.parent().unwrap_or(&paths.model).display()
    );

    let vocab = Vocabulary::load(&paths.vocab)?;

    let preprocessor = build_session(&paths.preprocessor, options)?;
    debug!("loaded preprocessor");

    let model = build_session(&paths.model, options)?;
    debug!("loaded encoder + CTC head");

    info!(
        "transcription engine ready: vocab_size={}, blank_idx={}",
        vocab.len(),
        vocab.blank_idx()
    );

    Ok(Sessions {
        preprocessor: Mutex::new(preprocessor),
        model: Mutex::new(model),
        vocab,
    })
}

impl Sessions {
    /// Run the full inference pipeline (CPU-bound, must be on blocking thread).
    fn run_inference(&self, samples: &[f32]) -> Result<Hypothesis, TranscriptionError> {
        let (features, features_len) = {
            let mut preprocessor = self.preprocessor.lock().inference("preprocessor lock")?;
            decoder::run_preprocessor(&mut preprocessor, samples)?
        };
        debug!("mel features: {:?}, len={}", features.shape(), features_len);

        let (logprobs, encoded_len) = {
            let mut model = self.model.lock().inference("model lock")?;
            decoder::run_model(&mut model, &features, features_len)?
        };
        debug!("logprobs: {:?}, encoded_len={}", logprobs.shape(), encoded_len);

        decoder::decode_hypothesis(&logprobs, encoded_len, &self.vocab)
    }
}

#[async_trait]
impl Transcriber for OnnxTranscriber {
    fn name(&self) -> &'static str {
        "onnx"
    }

    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<BackendOutput, TranscriptionError> {
        if request.language != self.language {
            return Err(TranscriptionError::ModelNotAvailable(format!(
                "engine loaded for '{}', request is '{}'",
                self.language, request.language
            )));
        }

        let path = request.audio_path.clone();
        let decoded = tokio::task::spawn_blocking(move || audio::decode_file(&path))
            .await
            .audio_decode("audio decode task")??;

        let duration_seconds = decoded.duration_seconds();
        debug!(
            source_rate = decoded.source_rate,
            source_channels = decoded.source_channels,
            "decoded {:.1}s of audio ({} samples)",
            duration_seconds,
            decoded.samples.len()
        );

        let sessions = Arc::clone(&self.sessions);
        let hypothesis =
            tokio::task::spawn_blocking(move || sessions.run_inference(&decoded.samples))
                .await
                .inference("inference task")??;

        Ok(BackendOutput {
            output: hypothesis.into(),
            duration_seconds: Some(duration_seconds),
        })
    }
}
