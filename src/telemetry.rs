//! Logging setup for the binary.
//!
//! Human-readable output goes to stdout and a JSON copy of every event is
//! written to `<logs_path>/concierge.log` through a non-blocking appender.
//!
//! Filter priority: `RUST_LOG` > `--log-level` > `LOG_LEVEL` > `info`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;

/// File name of the JSON log inside the logs directory.
pub const LOG_FILE_NAME: &str = "concierge.log";

/// Errors that can occur while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to create log directory {path:?}: {source}")]
    LogDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open log file: {0}")]
    Appender(#[from] InitError),

    #[error("Failed to install tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Picks the filter directive from the environment, the CLI and the config.
pub fn filter_directive(rust_log: Option<String>, cli_level: Option<&str>, config_level: &str) -> String {
    rust_log
        .filter(|value| !value.trim().is_empty())
        .or_else(|| cli_level.map(str::to_string))
        .unwrap_or_else(|| config_level.to_string())
}

/// Opens the JSON log file under `logs_path`.
///
/// The returned guard flushes pending lines when dropped and must be held
/// for as long as logging is needed.
pub fn log_writer(logs_path: &Path) -> Result<(NonBlocking, WorkerGuard), TelemetryError> {
    std::fs::create_dir_all(logs_path).map_err(|source| TelemetryError::LogDirectory {
        path: logs_path.to_path_buf(),
        source,
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(logs_path)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Installs the global subscriber.
pub fn init_telemetry(
    cli_level: Option<&str>,
    observability: &ObservabilityConfig,
) -> Result<WorkerGuard, TelemetryError> {
    let directive = filter_directive(
        std::env::var("RUST_LOG").ok(),
        cli_level,
        &observability.log_level,
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    let (writer, guard) = log_writer(&observability.logs_path)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().json().with_ansi(false).with_writer(writer))
        .try_init()?;

    Ok(guard)
}
