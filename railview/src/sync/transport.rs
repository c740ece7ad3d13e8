//! Request/response transport to the simulation server.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use super::error::SyncError;
use crate::model::Snapshot;

/// Boxed future type for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Largest number of ticks the server advances in one multi-tick request.
pub const MAX_MULTI_STEP: u32 = 100;

/// A snapshot-producing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRequest {
    /// Current state without advancing (`GET /simulation/state`).
    State,
    /// Advance one tick (`GET /simulation/tick`).
    Tick,
    /// Advance `n` ticks (`GET /simulation/multi-tick/{n}`).
    MultiTick(u32),
}

impl FetchRequest {
    /// Path relative to the server's API base.
    pub fn path(&self) -> String {
        match self {
            FetchRequest::State => "/simulation/state".to_string(),
            FetchRequest::Tick => "/simulation/tick".to_string(),
            FetchRequest::MultiTick(n) => format!("/simulation/multi-tick/{}", n),
        }
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchRequest::State => write!(f, "state"),
            FetchRequest::Tick => write!(f, "tick"),
            FetchRequest::MultiTick(n) => write!(f, "multi-tick({})", n),
        }
    }
}

/// Trait for request/response access to the simulation server.
///
/// This abstraction keeps the sync client independent of HTTP and lets tests
/// script responses, delays and failures.
///
/// Implementations must not retry internally; the sync client owns timeouts,
/// cancellation and error reporting.
pub trait SnapshotTransport: Send + Sync {
    /// Fetch one snapshot.
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, Result<Snapshot, SyncError>>;

    /// Ask the server to reinitialize the simulation (`POST /simulation/start`).
    fn restart(&self) -> BoxFuture<'_, Result<(), SyncError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(FetchRequest::State.path(), "/simulation/state");
        assert_eq!(FetchRequest::Tick.path(), "/simulation/tick");
        assert_eq!(FetchRequest::MultiTick(7).path(), "/simulation/multi-tick/7");
    }

    #[test]
    fn test_display() {
        assert_eq!(FetchRequest::MultiTick(3).to_string(), "multi-tick(3)");
    }
}
