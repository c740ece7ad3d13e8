//! Application error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::sync::SyncError;
use crate::workflow::WorkflowError;

/// Errors surfaced by `DashboardApp`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Inspection failed: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The app was used after `shutdown()`.
    #[error("Dashboard has been shut down")]
    ShutDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::from(SyncError::Transport("connection refused".to_string()));
        assert_eq!(
            err.to_string(),
            "Sync failed: Transport error: connection refused"
        );
        assert_eq!(AppError::ShutDown.to_string(), "Dashboard has been shut down");
    }
}
