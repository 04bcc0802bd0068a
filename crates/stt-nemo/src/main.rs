//! # stt-nemo
//!
//! Prints the transcript of one audio file using a pretrained NeMo
//! FastConformer model. The transcript is the only output on stdout.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use stt_core::logging::{self, LOG_ENV};
use stt_core::{Language, TranscriptionRequest};
use stt_settings::{Backend, SttSettings};
use stt_transcription::{
    CommandTranscriber, EngineOptions, ModelSource, OnnxTranscriber, Transcriber, ensure_model,
    transcribe_file,
};

/// Transcribe a 16 kHz mono WAV file with a NeMo FastConformer model.
#[derive(Parser, Debug)]
#[command(name = "stt-nemo", version, about)]
struct Cli {
    /// Path to the audio file.
    wav_path: PathBuf,

    /// Language of the audio [default: models.defaultLanguage, normally en].
    #[arg(short, long, value_enum)]
    lang: Option<Language>,

    /// Directory holding the exported model (overrides the cache layout).
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Transcription backend (overrides settings).
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Settings file to load instead of the default location.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Fail instead of downloading missing model files.
    #[arg(long)]
    no_download: bool,

    /// Log to stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Fold command-line overrides into loaded settings.
    fn apply_to(&self, settings: &mut SttSettings) {
        if let Some(backend) = self.backend {
            settings.inference.backend = backend;
        }
        if self.no_download {
            settings.models.auto_download = false;
        }
    }

    fn language(&self, settings: &SttSettings) -> Language {
        self.lang.unwrap_or(settings.models.default_language)
    }
}

/// Construct the configured backend, fetching model files when needed.
async fn build_transcriber(
    settings: &SttSettings,
    language: Language,
    model_dir: Option<PathBuf>,
    quiet: bool,
) -> Result<Box<dyn Transcriber>> {
    match settings.inference.backend {
        Backend::Command => {
            let transcriber = CommandTranscriber::new(&settings.inference.command)
                .context("Failed to configure command backend")?;
            Ok(Box::new(transcriber))
        }
        Backend::Onnx => {
            let source = ModelSource {
                language,
                dir: model_dir.unwrap_or_else(|| settings.models.model_dir(language)),
                repo: settings.models.repo_for(language).map(str::to_string),
                allow_download: settings.models.auto_download,
            };
            let paths = ensure_model(&source)
                .await
                .with_context(|| format!("Model {} is not available", language.model_id()))?;
            let options = EngineOptions {
                intra_threads: settings.inference.intra_threads,
                quiet,
            };
            let transcriber = OnnxTranscriber::load(language, paths, options)
                .await
                .with_context(|| format!("Failed to load {}", language.model_id()))?;
            Ok(Box::new(transcriber))
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Settings first: the configured log level feeds the subscriber. Until it
    // is known, only -v and STT_NEMO_LOG decide what loading may report.
    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(stt_settings::settings_path);
    let bootstrap = logging::subscriber(logging::verbosity_filter(
        args.verbose,
        logging::QUIET_FILTER,
    ));
    let mut settings = tracing::subscriber::with_default(bootstrap, || {
        stt_settings::load_settings_from_path(&settings_path)
    })
    .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    args.apply_to(&mut settings);

    let level = logging::verbosity_filter(args.verbose, settings.logging.level.as_filter_str());
    logging::init_subscriber(level);
    let quiet = logging::is_quiet(level) && std::env::var_os(LOG_ENV).is_none();

    let language = args.language(&settings);
    tracing::info!(
        lang = %language,
        model = language.model_id(),
        backend = ?settings.inference.backend,
        "starting transcription"
    );

    anyhow::ensure!(
        args.wav_path.is_file(),
        "Audio file not found: {}",
        args.wav_path.display()
    );

    let transcriber =
        build_transcriber(&settings, language, args.model_dir.clone(), quiet).await?;
    let request = TranscriptionRequest::new(&args.wav_path, language);
    let result = transcribe_file(transcriber.as_ref(), &request)
        .await
        .with_context(|| format!("Failed to transcribe {}", args.wav_path.display()))?;

    if let Some(secs) = result.duration_seconds {
        tracing::debug!(duration_seconds = secs, "audio duration");
    }

    println!("{}", result.text);
    Ok(())
}
