//! Backend seam and the single-file transcription entry point.

use async_trait::async_trait;
use stt_core::{ModelOutput, TranscriptionRequest, TranscriptionResult};
use tracing::{debug, info_span, Instrument};

use crate::types::TranscriptionError;

/// What a backend returns for one file, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendOutput {
    /// The backend's result in whatever shape it produced.
    pub output: ModelOutput,
    /// Length of the decoded audio, when the backend decoded it itself.
    pub duration_seconds: Option<f64>,
}

/// Runs a pretrained model on one audio file.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Transcribe the file named by `request`.
    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<BackendOutput, TranscriptionError>;
}

/// Transcribe one file and collapse the backend output to plain text.
pub async fn transcribe_file(
    transcriber: &dyn Transcriber,
    request: &TranscriptionRequest,
) -> Result<TranscriptionResult, TranscriptionError> {
    let span = info_span!(
        "transcribe",
        backend = transcriber.name(),
        lang = %request.language,
        path = %request.audio_path.display()
    );

    async move {
        let BackendOutput {
            output,
            duration_seconds,
        } = transcriber.transcribe(request).await?;
        let text = single_line(&output.into_text());
        debug!(chars = text.len(), "transcription complete");

        Ok(TranscriptionResult {
            text,
            language: request.language,
            model_id: request.model_id().to_string(),
            duration_seconds,
        })
    }
    .instrument(span)
    .await
}

/// Join the non-empty lines of `text` with spaces so it prints as one line.
fn single_line(text: &str) -> String {
    if !text.contains(['\n', '\r']) {
        return text.to_string();
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
