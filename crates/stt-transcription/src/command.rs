//! External command backend.
//!
//! Runs a user-configured program that loads the pretrained model itself and
//! prints its result on stdout. JSON output is parsed into a [`ModelOutput`];
//! otherwise the last non-empty line is taken as the raw transcription text.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use stt_core::{ModelOutput, TranscriptionRequest};
use stt_settings::CommandSettings;
use tracing::{debug, warn};

use crate::transcriber::{BackendOutput, Transcriber};
use crate::types::{ResultExt, TranscriptionError};

/// Environment variable set for the child so the model framework stays quiet.
pub const TESTING_ENV: &str = "NEMO_TESTING";

/// Transcribes by spawning an external program per request.
#[derive(Clone, Debug)]
pub struct CommandTranscriber {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandTranscriber {
    /// Build from settings. Fails when no program is configured.
    pub fn new(settings: &CommandSettings) -> Result<Self, TranscriptionError> {
        if settings.program.trim().is_empty() {
            return Err(TranscriptionError::Backend(
                "no command configured (inference.command.program)".into(),
            ));
        }
        Ok(Self {
            program: settings.program.clone(),
            args: settings.args.clone(),
            timeout: Duration::from_millis(settings.timeout_ms),
        })
    }

    /// Arguments with placeholders filled in for `request`.
    pub fn render_args(&self, request: &TranscriptionRequest) -> Vec<String> {
        let audio = request.audio_path.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{audio}", &audio)
                    .replace("{lang}", request.language.code())
                    .replace("{model}", request.model_id())
            })
            .collect()
    }
}

/// Interpret the program's stdout.
///
/// Valid JSON is mapped through [`ModelOutput::from_json`]. Otherwise the
/// last non-empty line is the result, parsed as JSON when it is JSON, since
/// backends may print progress lines before it.
pub fn parse_stdout(stdout: &str) -> ModelOutput {
    if let Ok(value) = serde_json::from_str::<Value>(stdout.trim()) {
        return ModelOutput::from_json(value);
    }
    let last = stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map_or("", str::trim_end);
    match serde_json::from_str::<Value>(last) {
        Ok(value) => ModelOutput::from_json(value),
        Err(_) => ModelOutput::Raw(Value::String(last.to_string())),
    }
}

#[async_trait]
impl Transcriber for CommandTranscriber {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<BackendOutput, TranscriptionError> {
        let start = Instant::now();
        let args = self.render_args(request);

        let mut cmd = tokio::process::Command::new(&self.program);
        let _ = cmd
            .args(&args)
            .env(TESTING_ENV, "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %self.program, ?args, "spawning command backend");

        let child = cmd
            .spawn()
            .backend(&format!("failed to spawn '{}'", self.program))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.backend("command wait failed")?,
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(program = %self.program, timeout_ms, "command backend timed out");
                return Err(TranscriptionError::Backend(format!(
                    "'{}' timed out after {timeout_ms}ms",
                    self.program
                )));
            }
        };

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);

        debug!(exit_code, duration_ms, "command backend completed");
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim(), "command backend stderr");
        }

        if !output.status.success() {
            return Err(TranscriptionError::Backend(format!(
                "'{}' exited with code {exit_code}: {}",
                self.program,
                stderr.trim()
            )));
        }

        Ok(BackendOutput {
            output: parse_stdout(&stdout),
            duration_seconds: None,
        })
    }
}
