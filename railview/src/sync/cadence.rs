//! Pause/resume signal for the sync cadence.
//!
//! The aggregator requests a pause while an operator inspects a frozen alert
//! and a resume when the inspection ends. The sync client's cadence driver
//! subscribes to the signal; neither side knows about the other.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

/// What the cadence driver should currently do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CadenceRequest {
    #[default]
    Run,
    Pause,
}

/// Shared handle to the cadence signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CadenceControl {
    sender: Arc<watch::Sender<CadenceRequest>>,
}

impl Default for CadenceControl {
    fn default() -> Self {
        Self::new()
    }
}

impl CadenceControl {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(CadenceRequest::Run);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Request that the cadence stop issuing fetches. Returns true on a transition.
    pub fn pause(&self) -> bool {
        self.set(CadenceRequest::Pause)
    }

    /// Request that the cadence continue. Returns true on a transition.
    pub fn resume(&self) -> bool {
        self.set(CadenceRequest::Run)
    }

    pub fn current(&self) -> CadenceRequest {
        *self.sender.borrow()
    }

    pub fn is_paused(&self) -> bool {
        self.current() == CadenceRequest::Pause
    }

    pub fn subscribe(&self) -> watch::Receiver<CadenceRequest> {
        self.sender.subscribe()
    }

    fn set(&self, request: CadenceRequest) -> bool {
        let changed = self.sender.send_if_modified(|current| {
            if *current == request {
                false
            } else {
                *current = request;
                true
            }
        });
        if changed {
            info!(request = ?request, "Cadence request changed");
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_only() {
        let cadence = CadenceControl::new();
        assert!(!cadence.is_paused());
        assert!(!cadence.resume());
        assert!(cadence.pause());
        assert!(!cadence.pause());
        assert!(cadence.is_paused());
        assert!(cadence.resume());
    }

    #[test]
    fn test_subscribers_see_changes() {
        let cadence = CadenceControl::new();
        let mut rx = cadence.subscribe();
        assert!(!rx.has_changed().unwrap());

        cadence.clone().pause();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), CadenceRequest::Pause);
    }
}
