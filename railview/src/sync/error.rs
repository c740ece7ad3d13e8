//! Sync client errors.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while synchronizing with the simulation server.
///
/// Messages from underlying libraries are captured as strings so the error
/// can be cloned into the client's status and handed to several readers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// Network-level failure (connection refused, DNS, reset, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The response body was not a valid snapshot.
    #[error("Failed to decode snapshot: {0}")]
    Decode(String),

    /// The request did not complete within the configured window.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The request was aborted by `stop()` or shutdown. Never recorded as status.
    #[error("Request cancelled")]
    Cancelled,

    /// A caller passed an argument the server cannot honour.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The push channel failed to connect or closed with an error.
    #[error("Push channel error: {0}")]
    Push(String),
}

impl SyncError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncError::Cancelled)
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            SyncError::Status {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else if e.is_decode() {
            SyncError::Decode(e.to_string())
        } else {
            SyncError::Transport(e.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        SyncError::Push(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SyncError::Status {
            status: 503,
            url: "http://localhost:8002/api/simulation/tick".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 503 from http://localhost:8002/api/simulation/tick"
        );
        assert_eq!(
            SyncError::Timeout(Duration::from_millis(1500)).to_string(),
            "Request timed out after 1.5s"
        );
    }

    #[test]
    fn test_is_cancelled() {
        assert!(SyncError::Cancelled.is_cancelled());
        assert!(!SyncError::Transport("reset".to_string()).is_cancelled());
    }
}
