//! # stt-core
//!
//! Shared vocabulary for the `stt-nemo` crates:
//!
//! - **Languages**: [`Language`] with its fixed pretrained model identifiers
//! - **Requests/results**: [`TranscriptionRequest`], [`TranscriptionResult`]
//! - **Output normalization**: [`ModelOutput`] and [`Hypothesis`], the shapes a
//!   backend may hand back, collapsed to plain text
//! - **Logging**: stderr-only `tracing` subscriber setup

#![deny(unsafe_code)]

pub mod language;
pub mod logging;
pub mod output;
pub mod types;

pub use language::{Language, LanguageError};
pub use output::{Hypothesis, ModelOutput};
pub use types::{TranscriptionRequest, TranscriptionResult};
