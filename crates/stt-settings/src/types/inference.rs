//! Backend selection and tuning.

use serde::{Deserialize, Serialize};

/// Lowest accepted ONNX intra-op thread count.
pub const MIN_THREADS: usize = 1;
/// Highest accepted ONNX intra-op thread count.
pub const MAX_THREADS: usize = 64;

/// Which transcription backend runs the model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process ONNX Runtime over an exported model.
    #[default]
    Onnx,
    /// External program that prints the result on stdout.
    Command,
}

/// Backend settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InferenceSettings {
    /// Selected backend.
    pub backend: Backend,
    /// Intra-op thread count for the preprocessor and model sessions.
    pub intra_threads: usize,
    /// External command backend settings.
    pub command: CommandSettings,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Onnx,
            intra_threads: 4,
            command: CommandSettings::default(),
        }
    }
}

/// External command backend.
///
/// `args` may contain `{audio}`, `{lang}` and `{model}` placeholders, which
/// are replaced with the audio path, language code and model identifier.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommandSettings {
    /// Program to execute.
    pub program: String,
    /// Argument template.
    pub args: Vec<String>,
    /// Kill the program after this many milliseconds.
    pub timeout_ms: u64,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: vec![
                "{audio}".to_string(),
                "--lang".to_string(),
                "{lang}".to_string(),
            ],
            timeout_ms: 600_000,
        }
    }
}
