//! Transcription of a single audio file with a NeMo FastConformer hybrid model.
//!
//! # Architecture
//!
//! ```text
//! ONNX backend:
//!   audio file → symphonia decode → rubato resample to 16kHz mono f32
//!   → preprocessor.onnx → mel features [1, n_mels, T]
//!   → model.onnx (encoder + CTC head) → logprobs [1, T', V+1]
//!   → CTC greedy decode → token IDs → vocab.txt lookup → Hypothesis
//!
//! Command backend:
//!   external program (NEMO_TESTING=1) → stdout JSON/text → ModelOutput
//! ```
//!
//! Either way the backend's [`ModelOutput`](stt_core::ModelOutput) is
//! collapsed to plain text by [`transcribe_file`].

pub mod audio;
pub mod command;
pub mod decoder;
pub mod engine;
pub mod model;
pub mod transcriber;
pub mod types;
pub mod vocab;

pub use command::CommandTranscriber;
pub use engine::{EngineOptions, OnnxTranscriber};
pub use model::{ModelPaths, ModelSource, ensure_model};
pub use transcriber::{BackendOutput, Transcriber, transcribe_file};
pub use types::{ResultExt, TranscriptionError};
pub use vocab::Vocabulary;
