//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use railview::model::{Conflict, ConflictSource, RouteStop, Snapshot, Train};
use railview::sync::{BoxFuture, FetchRequest, SnapshotTransport, SyncError};

/// One scripted response.
pub enum Scripted {
    Snapshot(Snapshot, Duration),
    Fail(SyncError, Duration),
}

/// In-memory transport that plays back a script.
///
/// When the script is empty it answers with empty snapshots of increasing
/// tick, starting at 1 (or 0 after a restart).
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    next_tick: AtomicU64,
    calls: Mutex<Vec<FetchRequest>>,
    restarts: AtomicUsize,
    fail_restart: AtomicBool,
    restart_delay: Mutex<Duration>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            next_tick: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            restarts: AtomicUsize::new(0),
            fail_restart: AtomicBool::new(false),
            restart_delay: Mutex::new(Duration::ZERO),
        }
    }

    pub fn push_snapshot(&self, snapshot: Snapshot, delay: Duration) {
        self.script
            .lock()
            .push_back(Scripted::Snapshot(snapshot, delay));
    }

    pub fn push_tick(&self, tick: u64, delay: Duration) {
        self.push_snapshot(Snapshot::at_tick(tick), delay);
    }

    pub fn push_failure(&self, error: SyncError, delay: Duration) {
        self.script.lock().push_back(Scripted::Fail(error, delay));
    }

    pub fn fail_restart(&self, fail: bool) {
        self.fail_restart.store(fail, Ordering::SeqCst);
    }

    /// Delay the restart response. The server side restarts immediately.
    pub fn set_restart_delay(&self, delay: Duration) {
        *self.restart_delay.lock() = delay;
    }

    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

impl SnapshotTransport for ScriptedTransport {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, Result<Snapshot, SyncError>> {
        self.calls.lock().push(request);
        let next = self.script.lock().pop_front();
        let next = next.unwrap_or_else(|| {
            let tick = self.next_tick.fetch_add(1, Ordering::SeqCst);
            Scripted::Snapshot(Snapshot::at_tick(tick), Duration::ZERO)
        });

        Box::pin(async move {
            match next {
                Scripted::Snapshot(snapshot, delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(snapshot)
                }
                Scripted::Fail(error, delay) => {
                    tokio::time::sleep(delay).await;
                    Err(error)
                }
            }
        })
    }

    fn restart(&self) -> BoxFuture<'_, Result<(), SyncError>> {
        Box::pin(async move {
            if self.fail_restart.load(Ordering::SeqCst) {
                return Err(SyncError::Status {
                    status: 503,
                    url: "scripted://simulation/start".to_string(),
                });
            }
            self.restarts.fetch_add(1, Ordering::SeqCst);
            self.next_tick.store(0, Ordering::SeqCst);
            let delay = *self.restart_delay.lock();
            tokio::time::sleep(delay).await;
            Ok(())
        })
    }
}

/// Milano - Lodi - Piacenza: 10 km then 20 km, due south-east.
pub fn route() -> Vec<RouteStop> {
    vec![
        RouteStop::new("MILANO", 45.00, 9.00, 0.0),
        RouteStop::new("LODI", 44.90, 9.10, 10.0),
        RouteStop::new("PIACENZA", 44.70, 9.30, 20.0),
    ]
}

pub fn train(id: &str, speed_kmh: f64) -> Train {
    Train::new(id, route(), speed_kmh)
}

pub fn prediction(id: &str, probability: f64) -> Conflict {
    Conflict::new(id, ConflictSource::Prediction, probability).with_trains(["IC501", "R2231"])
}

pub fn snapshot(tick: u64, trains: Vec<Train>, predictions: Vec<Conflict>) -> Snapshot {
    Snapshot {
        trains,
        predictions,
        ..Snapshot::at_tick(tick)
    }
}
