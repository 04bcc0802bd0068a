//! Stderr-only `tracing` setup.
//!
//! The transcript is the only thing written to stdout, so every subscriber
//! installed here writes to stderr. The default filter is `off`: a plain
//! invocation prints nothing but the transcript.

pub mod test_utils;

pub use test_utils::{CapturedLogs, capture_logs};

/// Environment variable holding an `EnvFilter` directive that overrides
/// both the command-line verbosity and the configured level.
pub const LOG_ENV: &str = "STT_NEMO_LOG";

/// Filter used when nothing asks for output.
pub const QUIET_FILTER: &str = "off";

/// Pick the filter directive for a `-v` count.
///
/// Zero falls back to `configured` (the settings value).
pub fn verbosity_filter(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Whether a filter directive silences everything.
pub fn is_quiet(filter: &str) -> bool {
    filter.trim().eq_ignore_ascii_case(QUIET_FILTER)
}

/// Build a stderr-only subscriber for `level` without installing it.
///
/// [`LOG_ENV`] takes precedence over `level` when set and valid. Useful with
/// `tracing::subscriber::with_default` before the final level is known.
pub fn subscriber(level: &str) -> impl tracing::Subscriber + Send + Sync + 'static {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish()
}

/// Initialize the global tracing subscriber with stderr output only.
///
/// Call once at startup. Subsequent calls are no-ops.
pub fn init_subscriber(level: &str) {
    // set_global_default fails if already set
    let _ = tracing::subscriber::set_global_default(subscriber(level));
}
