//! Logging and tracing setup for the docdump binary
//!
//! Human-readable output goes to stderr so that stdout only carries the run
//! report. With a log directory configured, a JSON copy of every event is also
//! written to a daily rolling file.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LOG_FILE_PREFIX: &str = "docdump.log";

/// Crates whose events are filtered by the configured level; everything else
/// stays at `warn`.
const OWN_CRATES: &[&str] = &[
    "docdump",
    "docdump_core",
    "docdump_drivers",
    "docdump_driver_sqlite",
    "docdump_export",
];

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level for this program's own crates
    pub level: String,

    /// Directory for JSON log files; `None` disables file logging
    pub log_dir: Option<PathBuf>,

    /// Whether to include file/line information in console output
    pub include_location: bool,

    /// Whether to colorize console output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            include_location: cfg!(debug_assertions),
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub fn default_filter(&self) -> String {
        let mut directives = vec!["warn".to_string()];
        directives.extend(OWN_CRATES.iter().map(|c| format!("{}={}", c, self.level)));
        directives.join(",")
    }

    fn env_filter(&self) -> EnvFilter {
        // RUST_LOG wins over the configured level
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_filter()))
    }
}

/// Initialize the global subscriber.
///
/// The returned guard flushes the file writer when dropped and must be kept
/// alive until the program exits.
pub fn init(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let mut layers = Vec::new();

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_ansi(config.ansi)
        .with_filter(config.env_filter())
        .boxed();
    layers.push(console_layer);

    let mut guard = None;
    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir)?;

        let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(config.env_filter())
            .boxed();
        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::debug!(
        level = %config.level,
        log_dir = ?config.log_dir,
        "logging initialized"
    );

    Ok(guard)
}
