//! Tracing subscriber setup.
//!
//! Logs go to stderr, or to a file through a non-blocking writer when one is
//! configured. `RUST_LOG` overrides the configured level.

use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("Invalid log file path: {0}")]
    InvalidPath(String),

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Keeps the background log writer alive. Drop it last.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// `level` is any `EnvFilter` directive (`info`, `railview=debug`, ...).
pub fn init_logging(level: &str, file: Option<&Path>) -> Result<LogGuard, LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter {
            filter: level.to_string(),
            message: e.to_string(),
        })?,
    };

    match file {
        Some(path) => {
            let name = path
                .file_name()
                .ok_or_else(|| LoggingError::InvalidPath(path.display().to_string()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .try_init()
                .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

            Ok(LogGuard {
                _worker: Some(guard),
            })
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

            Ok(LogGuard { _worker: None })
        }
    }
}
