//! Request and result types for a single transcription.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// One file to transcribe in one language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptionRequest {
    /// Path to the audio file (16 kHz mono WAV expected).
    pub audio_path: PathBuf,
    /// Language whose model should be used.
    pub language: Language,
}

impl TranscriptionRequest {
    /// Create a request.
    pub fn new(audio_path: impl Into<PathBuf>, language: Language) -> Self {
        Self {
            audio_path: audio_path.into(),
            language,
        }
    }

    /// Model identifier the request resolves to.
    pub fn model_id(&self) -> &'static str {
        self.language.model_id()
    }
}

/// Result of transcribing an audio file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionResult {
    /// The transcribed text. May be empty.
    pub text: String,
    /// Language the audio was transcribed as.
    pub language: Language,
    /// Model identifier used.
    pub model_id: String,
    /// Duration of the decoded audio in seconds, when the backend knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}
