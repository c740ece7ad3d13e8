//! Dashboard bootstrap implementation.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::AppConfig;
use super::error::AppError;
use crate::alerts::{AlertFilter, AlertViewState, ConflictAggregator, InspectionState};
use crate::model::Conflict;
use crate::motion::{MotionTracker, TrainPosition};
use crate::sync::{
    FeedMode, FetchOutcome, HttpTransport, PollingFeed, PublishedSnapshot, PushFeed,
    SnapshotTransport, SyncClient, SyncStatus, UpdateFeed,
};
use crate::workflow::{
    InspectionWorkflow, ResolutionAdvisor, ResolutionOption, SuggestionAdvisor,
};

/// An open inspection with the advisor's ranked options.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub conflict: Conflict,
    pub options: Vec<ResolutionOption>,
}

/// Status of the whole core for a status line.
#[derive(Debug, Clone)]
pub struct DashboardStatus {
    pub sync: SyncStatus,
    pub tracked_trains: usize,
    pub frozen: bool,
    pub inspecting: Option<InspectionState>,
    pub frames: u64,
}

/// Publications buffered between frames. Push bursts and manual steps
/// landing alongside a poll stay well below this.
const UPDATE_QUEUE_CAPACITY: usize = 256;

/// What one frame did.
#[derive(Debug, Default)]
struct FrameReport {
    reset: bool,
    applied_tick: Option<u64>,
    applied: usize,
    evicted: usize,
}

/// State touched by the frame loop. Only ever accessed under the app's lock.
struct DashboardCore {
    tracker: MotionTracker,
    aggregator: ConflictAggregator,
    workflow: InspectionWorkflow,
    updates: mpsc::Receiver<PublishedSnapshot>,
    epoch: u64,
    frames: u64,
}

impl DashboardCore {
    /// Apply every snapshot published since the last frame, in order, then
    /// advance motion by `elapsed`.
    fn frame(&mut self, elapsed: Duration) -> FrameReport {
        let mut report = FrameReport::default();
        self.frames += 1;

        while let Ok(published) = self.updates.try_recv() {
            self.apply(published, &mut report);
        }

        self.tracker.advance(elapsed);
        report
    }

    fn apply(&mut self, published: PublishedSnapshot, report: &mut FrameReport) {
        if published.epoch != self.epoch {
            info!(epoch = published.epoch, "New simulation run, clearing derived state");
            self.tracker.clear();
            self.aggregator.reset();
            self.workflow.clear();
            self.epoch = published.epoch;
            report.reset = true;
        }

        let Some(snapshot) = published.snapshot else {
            return;
        };
        let resync = self.tracker.resync(&snapshot);
        if !resync.evicted.is_empty() {
            debug!(evicted = ?resync.evicted, "Evicted trains");
        }
        report.applied_tick = Some(snapshot.tick_number);
        report.applied += 1;
        report.evicted += resync.evicted.len();
        self.aggregator.ingest(snapshot);
    }
}

/// The dashboard core with explicit construction and teardown.
///
/// # Example
///
/// ```ignore
/// let app = DashboardApp::start(config, transport, feed);
/// app.step().await?;
/// let alerts = app.alerts();
/// app.shutdown().await;
/// ```
pub struct DashboardApp {
    sync: SyncClient,
    core: Arc<Mutex<DashboardCore>>,
    advisor: Arc<dyn ResolutionAdvisor>,
    frame_shutdown: CancellationToken,
    frame_task: Mutex<Option<JoinHandle<()>>>,
    config: AppConfig,
}

impl DashboardApp {
    /// Wire the components and spawn the frame loop.
    ///
    /// The sync cadence is not started; call [`start_cadence`](Self::start_cadence).
    /// Must be called from within a Tokio runtime.
    pub fn start(
        config: AppConfig,
        transport: Arc<dyn SnapshotTransport>,
        feed: Arc<dyn UpdateFeed>,
    ) -> Self {
        Self::start_with_advisor(config, transport, feed, Arc::new(SuggestionAdvisor))
    }

    pub fn start_with_advisor(
        config: AppConfig,
        transport: Arc<dyn SnapshotTransport>,
        feed: Arc<dyn UpdateFeed>,
        advisor: Arc<dyn ResolutionAdvisor>,
    ) -> Self {
        let sync = SyncClient::new(transport, feed, config.sync.clone());
        let aggregator =
            ConflictAggregator::new(config.alerts.clone()).with_cadence(sync.cadence());

        let core = Arc::new(Mutex::new(DashboardCore {
            tracker: MotionTracker::new(config.motion.clone()),
            aggregator,
            workflow: InspectionWorkflow::new(),
            updates: sync.subscribe_queue(UPDATE_QUEUE_CAPACITY),
            epoch: 0,
            frames: 0,
        }));

        let frame_shutdown = CancellationToken::new();
        let frame_task = tokio::spawn(run_frames(
            Arc::clone(&core),
            config.motion.frame_interval(),
            frame_shutdown.clone(),
        ));

        info!(
            base_url = %config.sync.base_url,
            mode = %config.sync.mode,
            frame_rate = config.motion.frame_rate,
            "Dashboard started"
        );

        Self {
            sync,
            core,
            advisor,
            frame_shutdown,
            frame_task: Mutex::new(Some(frame_task)),
            config,
        }
    }

    /// Build the HTTP transport and the configured feed, then start.
    pub fn connect(config: AppConfig) -> Result<Self, AppError> {
        let transport = HttpTransport::new(&config.sync.base_url, config.sync.request_timeout)?;
        let feed: Arc<dyn UpdateFeed> = match config.sync.mode {
            FeedMode::Poll => Arc::new(PollingFeed::new(config.sync.tick_interval)),
            FeedMode::Push => Arc::new(PushFeed::new(
                config.sync.effective_push_url(),
                config.sync.reconnect_backoff,
            )),
        };
        Ok(Self::start(config, Arc::new(transport), feed))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sync(&self) -> &SyncClient {
        &self.sync
    }

    // =========================================================================
    // Control surface
    // =========================================================================

    pub fn start_cadence(&self) -> Result<bool, AppError> {
        self.ensure_running()?;
        Ok(self.sync.start())
    }

    pub fn stop_cadence(&self) -> bool {
        self.sync.stop()
    }

    pub async fn step(&self) -> Result<FetchOutcome, AppError> {
        self.ensure_running()?;
        let outcome = self.sync.step().await;
        self.apply_now();
        Ok(outcome?)
    }

    pub async fn multi_step(&self, n: u32) -> Result<FetchOutcome, AppError> {
        self.ensure_running()?;
        let outcome = self.sync.multi_step(n).await;
        self.apply_now();
        Ok(outcome?)
    }

    pub async fn refresh(&self) -> Result<FetchOutcome, AppError> {
        self.ensure_running()?;
        let outcome = self.sync.refresh().await;
        self.apply_now();
        Ok(outcome?)
    }

    /// Reset the simulation. Motion and alert state from the previous run is
    /// dropped before this returns, even if re-seeding fails.
    pub async fn reset(&self) -> Result<FetchOutcome, AppError> {
        self.ensure_running()?;
        let outcome = self.sync.reset().await;
        self.apply_now();
        Ok(outcome?)
    }

    /// Run a zero-length frame so published data is visible immediately.
    fn apply_now(&self) {
        let report = self.core.lock().frame(Duration::ZERO);
        if report.reset || report.applied_tick.is_some() {
            debug!(
                reset = report.reset,
                tick = ?report.applied_tick,
                applied = report.applied,
                "Applied outside frame loop"
            );
        }
    }

    fn ensure_running(&self) -> Result<(), AppError> {
        if self.frame_shutdown.is_cancelled() {
            Err(AppError::ShutDown)
        } else {
            Ok(())
        }
    }

    // =========================================================================
    // Read side
    // =========================================================================

    /// Interpolated train positions for now.
    pub fn positions(&self) -> Vec<TrainPosition> {
        self.core.lock().tracker.positions()
    }

    pub fn position(&self, train_id: &str) -> Option<TrainPosition> {
        self.core.lock().tracker.position(train_id)
    }

    /// The alert feed as presented.
    pub fn alerts(&self) -> AlertViewState {
        self.core.lock().aggregator.view().clone()
    }

    pub fn set_alert_filter(&self, filter: AlertFilter) {
        self.core.lock().aggregator.set_filter(filter);
    }

    pub fn status(&self) -> DashboardStatus {
        let core = self.core.lock();
        DashboardStatus {
            sync: self.sync.status(),
            tracked_trains: core.tracker.len(),
            frozen: core.aggregator.is_frozen(),
            inspecting: core.aggregator.inspection(),
            frames: core.frames,
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Open a conflict: freezes the alert feed, pauses the cadence and asks
    /// the advisor for options.
    pub async fn inspect(&self, conflict_id: &str) -> Result<Inspection, AppError> {
        self.ensure_running()?;
        let conflict = {
            let mut core = self.core.lock();
            let DashboardCore {
                aggregator,
                workflow,
                ..
            } = &mut *core;
            workflow.inspect(aggregator, conflict_id)?
        };
        let options = self.advisor.advise(&conflict).await?;
        Ok(Inspection { conflict, options })
    }

    /// Close the open inspection and resume live updates.
    pub fn dismiss(&self) {
        let mut core = self.core.lock();
        let DashboardCore {
            aggregator,
            workflow,
            ..
        } = &mut *core;
        workflow.dismiss(aggregator);
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Stop the cadence, abort in-flight requests and stop the frame loop.
    /// Idempotent.
    pub async fn shutdown(&self) {
        self.sync.shutdown().await;
        self.frame_shutdown.cancel();
        let task = self.frame_task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Frame loop ended abnormally");
            }
            info!("Dashboard shut down");
        }
    }
}

async fn run_frames(
    core: Arc<Mutex<DashboardCore>>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last = Instant::now();

    debug!(interval_ms = interval.as_millis() as u64, "Frame loop started");
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let now = Instant::now();
        let elapsed = now.duration_since(last);
        last = now;

        let report = core.lock().frame(elapsed);
        if let Some(tick) = report.applied_tick {
            debug!(
                tick,
                applied = report.applied,
                reset = report.reset,
                evicted = report.evicted,
                "Frame applied snapshots"
            );
        }
    }
    debug!("Frame loop stopped");
}
