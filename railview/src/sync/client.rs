//! The sync client: owner of the authoritative snapshot.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cadence::CadenceControl;
use super::config::SyncConfig;
use super::error::SyncError;
use super::feed::{FeedContext, UpdateFeed};
use super::transport::{FetchRequest, SnapshotTransport, MAX_MULTI_STEP};
use crate::model::Snapshot;

/// How a completed fetch was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The snapshot was applied and published.
    Applied(u64),
    /// The snapshot's tick did not advance past the last applied one.
    Stale { tick: u64, last_applied: u64 },
    /// A newer request was initiated before this one resolved.
    Superseded,
}

/// How a pushed snapshot was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Stale { last_applied: u64 },
}

/// Counters for status display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub applied: u64,
    pub stale_discarded: u64,
    pub superseded: u64,
    pub failures: u64,
}

/// What subscribers observe: the current snapshot and the run it belongs to.
///
/// `epoch` increments on every reset; a change tells consumers to drop all
/// state derived from earlier snapshots.
#[derive(Debug, Clone, Default)]
pub struct PublishedSnapshot {
    pub snapshot: Option<Arc<Snapshot>>,
    pub epoch: u64,
}

/// Point-in-time view of the client for status displays.
#[derive(Debug, Clone)]
pub struct SyncStatus {
    pub running: bool,
    pub feed: &'static str,
    pub tick: Option<u64>,
    pub epoch: u64,
    pub error: Option<SyncError>,
    pub stats: SyncStats,
}

struct InFlight {
    generation: u64,
    token: CancellationToken,
}

/// Identity of one initiated request.
struct Ticket {
    generation: u64,
    token: CancellationToken,
}

#[derive(Default)]
struct SyncState {
    snapshot: Option<Arc<Snapshot>>,
    last_applied_tick: Option<u64>,
    epoch: u64,
    error: Option<SyncError>,
    latest_generation: u64,
    inflight: Option<InFlight>,
    running: bool,
    session: Option<CancellationToken>,
    feed_task: Option<JoinHandle<()>>,
    stats: SyncStats,
    queues: Vec<mpsc::Sender<PublishedSnapshot>>,
}

struct SyncInner {
    transport: Arc<dyn SnapshotTransport>,
    feed: Arc<dyn UpdateFeed>,
    config: SyncConfig,
    state: Mutex<SyncState>,
    publisher: watch::Sender<PublishedSnapshot>,
    cadence: CadenceControl,
    disposed: CancellationToken,
    /// Held exclusively while the server restarts; requests are registered
    /// under a shared hold so none can start mid-restart.
    restart_gate: RwLock<()>,
}

/// Keeps a local snapshot in sync with the simulation server.
///
/// At most one request is in flight: initiating a request cancels the
/// previous one, and any completion whose request was superseded is
/// discarded. Snapshots are applied only when their tick strictly exceeds
/// the last applied tick. Transport failures are recorded in [`error`] while
/// the last good snapshot stays published.
///
/// Cheap to clone; all clones share one client.
///
/// [`error`]: SyncClient::error
#[derive(Clone)]
pub struct SyncClient {
    inner: Arc<SyncInner>,
}

impl SyncClient {
    pub fn new(
        transport: Arc<dyn SnapshotTransport>,
        feed: Arc<dyn UpdateFeed>,
        config: SyncConfig,
    ) -> Self {
        let (publisher, _) = watch::channel(PublishedSnapshot::default());
        Self {
            inner: Arc::new(SyncInner {
                transport,
                feed,
                config,
                state: Mutex::new(SyncState::default()),
                publisher,
                cadence: CadenceControl::new(),
                disposed: CancellationToken::new(),
                restart_gate: RwLock::new(()),
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// The pause/resume signal the cadence driver follows.
    pub fn cadence(&self) -> CadenceControl {
        self.inner.cadence.clone()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start the update feed. Returns false if it was already running or the
    /// client has been shut down.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut state = self.inner.state.lock();
        if state.running {
            debug!("Sync client already running");
            return false;
        }
        if self.inner.disposed.is_cancelled() {
            warn!("Sync client start after shutdown ignored");
            return false;
        }

        let session = self.inner.disposed.child_token();
        let ctx = FeedContext::new(self.clone(), session.clone(), self.inner.cadence.subscribe());
        let feed = Arc::clone(&self.inner.feed);
        let handle = tokio::spawn(async move { feed.run(ctx).await });

        state.running = true;
        state.session = Some(session);
        state.feed_task = Some(handle);
        info!(feed = self.inner.feed.name(), "Sync client started");
        true
    }

    /// Stop the feed and abort any in-flight request.
    ///
    /// Safe to call repeatedly or before `start()`. Returns true if the feed
    /// was running.
    pub fn stop(&self) -> bool {
        let mut state = self.inner.state.lock();
        if let Some(inflight) = state.inflight.take() {
            inflight.token.cancel();
        }
        if !state.running {
            return false;
        }
        state.running = false;
        if let Some(session) = state.session.take() {
            session.cancel();
        }
        info!("Sync client stopped");
        true
    }

    /// Stop and wait for the feed task to finish. The client cannot be
    /// restarted afterwards.
    pub async fn shutdown(&self) {
        self.stop();
        self.inner.disposed.cancel();
        let task = self.inner.state.lock().feed_task.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Feed task ended abnormally");
            }
        }
        debug!("Sync client shut down");
    }

    // =========================================================================
    // Manual control
    // =========================================================================

    /// Advance the simulation by one tick outside the regular cadence.
    pub async fn step(&self) -> Result<FetchOutcome, SyncError> {
        self.fetch(FetchRequest::Tick).await
    }

    /// Advance the simulation by `n` ticks in one request.
    ///
    /// `n` is capped at the server's limit of 100.
    pub async fn multi_step(&self, n: u32) -> Result<FetchOutcome, SyncError> {
        if n == 0 {
            return Err(SyncError::InvalidArgument(
                "multi-step count must be at least 1".to_string(),
            ));
        }
        let capped = n.min(MAX_MULTI_STEP);
        if capped != n {
            debug!(requested = n, capped, "Multi-step count capped");
        }
        self.fetch(FetchRequest::MultiTick(capped)).await
    }

    /// Fetch the current state without advancing.
    pub async fn refresh(&self) -> Result<FetchOutcome, SyncError> {
        self.fetch(FetchRequest::State).await
    }

    /// Reinitialize the server and re-seed the local snapshot.
    ///
    /// The restart itself cannot be superseded: it cancels whatever is in
    /// flight, and requests initiated while it is pending wait until the new
    /// run has been seeded. `stop()` does not abort it. Once the server has
    /// restarted the epoch advances, so subscribers drop all derived state
    /// before the new run's first snapshot arrives. If the restart fails
    /// nothing local changes.
    pub async fn reset(&self) -> Result<FetchOutcome, SyncError> {
        if self.inner.disposed.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        let _restarting = self.inner.restart_gate.write().await;
        let token = self.supersede_inflight();
        info!("Resetting simulation");

        let restarted = self.bounded(&token, self.inner.transport.restart()).await;
        {
            let mut state = self.inner.state.lock();
            if let Err(e) = restarted {
                return Err(self.record_failure(&mut state, e));
            }

            state.epoch += 1;
            state.last_applied_tick = None;
            state.snapshot = None;
            self.publish(&mut state);
            info!(epoch = state.epoch, "Simulation reset");
        }

        let ticket = self.begin(&self.inner.disposed);
        self.complete(FetchRequest::State, ticket).await
    }

    /// Initiate a request, superseding whatever is in flight.
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchOutcome, SyncError> {
        self.fetch_within(request, &self.inner.disposed).await
    }

    pub(crate) async fn fetch_within(
        &self,
        request: FetchRequest,
        parent: &CancellationToken,
    ) -> Result<FetchOutcome, SyncError> {
        if parent.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        let ticket = {
            let _gate = self.inner.restart_gate.read().await;
            self.begin(parent)
        };
        self.complete(request, ticket).await
    }

    async fn complete(&self, request: FetchRequest, ticket: Ticket) -> Result<FetchOutcome, SyncError> {
        debug!(request = %request, generation = ticket.generation, "Fetching snapshot");

        let result = self
            .bounded(&ticket.token, self.inner.transport.fetch(request))
            .await;

        let mut state = self.inner.state.lock();
        if state.latest_generation != ticket.generation {
            debug!(request = %request, generation = ticket.generation, "Discarding superseded response");
            state.stats.superseded += 1;
            return Ok(FetchOutcome::Superseded);
        }
        state.inflight = None;
        if ticket.token.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        match result {
            Ok(snapshot) => Ok(self.apply_locked(&mut state, snapshot)),
            Err(e) => Err(self.record_failure(&mut state, e)),
        }
    }

    /// Cancel the in-flight request without registering a new one, so that
    /// its completion is discarded and `stop()` has nothing to abort.
    fn supersede_inflight(&self) -> CancellationToken {
        let mut state = self.inner.state.lock();
        if let Some(previous) = state.inflight.take() {
            debug!(generation = previous.generation, "Cancelling in-flight request");
            previous.token.cancel();
        }
        state.latest_generation += 1;
        self.inner.disposed.child_token()
    }

    /// Register a new request as the only one in flight.
    fn begin(&self, parent: &CancellationToken) -> Ticket {
        let mut state = self.inner.state.lock();
        if let Some(previous) = state.inflight.take() {
            debug!(generation = previous.generation, "Cancelling in-flight request");
            previous.token.cancel();
        }
        state.latest_generation += 1;
        let token = parent.child_token();
        state.inflight = Some(InFlight {
            generation: state.latest_generation,
            token: token.clone(),
        });
        Ticket {
            generation: state.latest_generation,
            token,
        }
    }

    /// Run a transport call under a cancellation token and the timeout.
    async fn bounded<T>(
        &self,
        token: &CancellationToken,
        call: impl std::future::Future<Output = Result<T, SyncError>>,
    ) -> Result<T, SyncError> {
        let timeout = self.inner.config.request_timeout;
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(SyncError::Cancelled),
            result = tokio::time::timeout(timeout, call) => match result {
                Ok(inner) => inner,
                Err(_) => Err(SyncError::Timeout(timeout)),
            },
        }
    }

    fn record_failure(&self, state: &mut SyncState, error: SyncError) -> SyncError {
        if !error.is_cancelled() {
            warn!(error = %error, "Sync request failed");
            state.stats.failures += 1;
            state.error = Some(error.clone());
        }
        error
    }

    // =========================================================================
    // Application
    // =========================================================================

    fn apply_locked(&self, state: &mut SyncState, snapshot: Snapshot) -> FetchOutcome {
        let tick = snapshot.tick_number;
        if let Some(last_applied) = state.last_applied_tick {
            if tick <= last_applied {
                debug!(tick, last_applied, "Discarding snapshot that does not advance the tick");
                state.stats.stale_discarded += 1;
                return FetchOutcome::Stale { tick, last_applied };
            }
        }

        state.last_applied_tick = Some(tick);
        state.snapshot = Some(Arc::new(snapshot));
        state.error = None;
        state.stats.applied += 1;
        self.publish(state);
        debug!(tick, "Applied snapshot");
        FetchOutcome::Applied(tick)
    }

    pub(crate) fn apply_pushed(&self, snapshot: Snapshot) -> ApplyOutcome {
        let mut state = self.inner.state.lock();
        match self.apply_locked(&mut state, snapshot) {
            FetchOutcome::Stale { last_applied, .. } => ApplyOutcome::Stale { last_applied },
            _ => ApplyOutcome::Applied,
        }
    }

    pub(crate) fn record_error(&self, error: SyncError) {
        let mut state = self.inner.state.lock();
        self.record_failure(&mut state, error);
    }

    fn publish(&self, state: &mut SyncState) {
        let published = PublishedSnapshot {
            snapshot: state.snapshot.clone(),
            epoch: state.epoch,
        };
        state.queues.retain(|queue| match queue.try_send(published.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(epoch = published.epoch, "Update queue full, publication dropped");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
        self.inner.publisher.send_replace(published);
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    /// The last recorded failure, cleared by the next applied snapshot.
    pub fn error(&self) -> Option<SyncError> {
        self.inner.state.lock().error.clone()
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.state.lock().snapshot.clone()
    }

    pub fn epoch(&self) -> u64 {
        self.inner.state.lock().epoch
    }

    pub fn stats(&self) -> SyncStats {
        self.inner.state.lock().stats
    }

    /// Observe the latest publication. Intermediate ones may be skipped.
    pub fn subscribe(&self) -> watch::Receiver<PublishedSnapshot> {
        self.inner.publisher.subscribe()
    }

    /// Receive every publication in order, including resets.
    ///
    /// Publications are dropped with a warning while the queue is full.
    pub fn subscribe_queue(&self, capacity: usize) -> mpsc::Receiver<PublishedSnapshot> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.inner.state.lock().queues.push(tx);
        rx
    }

    pub fn status(&self) -> SyncStatus {
        let state = self.inner.state.lock();
        SyncStatus {
            running: state.running,
            feed: self.inner.feed.name(),
            tick: state.snapshot.as_ref().map(|s| s.tick_number),
            epoch: state.epoch,
            error: state.error.clone(),
            stats: state.stats,
        }
    }
}
