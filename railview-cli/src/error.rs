//! CLI error type.

use std::fmt;

use railview::app::AppError;
use railview::config::ConfigError;
use railview::logging::LoggingError;
use railview::sync::SyncError;

/// Errors reported by CLI commands. Printed once by `main` before exiting.
#[derive(Debug)]
pub enum CliError {
    /// Bad configuration or arguments.
    Config(String),
    /// Logging could not be set up.
    Logging(String),
    /// The async runtime could not be created.
    Runtime(String),
    /// A request to the simulation server failed.
    Sync(SyncError),
    /// The dashboard core refused an operation.
    Dashboard(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(msg) => write!(f, "Logging error: {}", msg),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            CliError::Sync(e) => write!(f, "{}", e),
            CliError::Dashboard(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e.to_string())
    }
}

impl From<SyncError> for CliError {
    fn from(e: SyncError) -> Self {
        CliError::Sync(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Sync(e) => CliError::Sync(e),
            AppError::Config(e) => CliError::Config(e.to_string()),
            other => CliError::Dashboard(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_sync_error_unwrapped() {
        let err: CliError = AppError::Sync(SyncError::Cancelled).into();
        assert!(matches!(err, CliError::Sync(SyncError::Cancelled)));
    }

    #[test]
    fn test_display() {
        let err = CliError::Config("bad base_url".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad base_url");
    }
}
