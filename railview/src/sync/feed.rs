//! Cadence drivers that keep the snapshot fresh.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cadence::CadenceRequest;
use super::client::{ApplyOutcome, FetchOutcome, SyncClient};
use super::error::SyncError;
use super::transport::{BoxFuture, FetchRequest};
use crate::model::Snapshot;

/// A source of snapshot updates driven by the sync client's lifecycle.
///
/// `run` is spawned by [`SyncClient::start`] and must return promptly once
/// the context's shutdown token is cancelled.
pub trait UpdateFeed: Send + Sync {
    fn run(&self, ctx: FeedContext) -> BoxFuture<'_, ()>;

    /// Short name for logs and status.
    fn name(&self) -> &'static str;
}

/// What a running feed may do to the client.
pub struct FeedContext {
    client: SyncClient,
    shutdown: CancellationToken,
    cadence: watch::Receiver<CadenceRequest>,
}

impl FeedContext {
    pub(crate) fn new(
        client: SyncClient,
        shutdown: CancellationToken,
        cadence: watch::Receiver<CadenceRequest>,
    ) -> Self {
        Self {
            client,
            shutdown,
            cadence,
        }
    }

    /// Cancelled when the client stops.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Whether the feed should still hold a connection open.
    ///
    /// Cleared by `stop()` and shutdown, never by errors, so an intentional
    /// stop does not trigger reconnects.
    pub fn should_connect(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// Fetch through the client, superseding any in-flight request.
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchOutcome, SyncError> {
        self.client.fetch_within(request, &self.shutdown).await
    }

    /// Fetch on a separate task so a slow response never delays the cadence.
    pub fn spawn_fetch(&self, request: FetchRequest) {
        let client = self.client.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            // Errors are recorded in the client's status.
            let _ = client.fetch_within(request, &shutdown).await;
        });
    }

    /// Apply a pushed snapshot through the tick-order guard.
    pub fn apply(&self, snapshot: Snapshot) -> ApplyOutcome {
        self.client.apply_pushed(snapshot)
    }

    /// Record a feed-level failure as the client's error status.
    pub fn record_error(&self, error: SyncError) {
        self.client.record_error(error);
    }

    pub fn is_paused(&self) -> bool {
        *self.cadence.borrow() == CadenceRequest::Pause
    }

    /// Wait until the cadence is not paused.
    ///
    /// Returns false if the client stopped while waiting.
    pub async fn wait_for_run(&mut self) -> bool {
        loop {
            if *self.cadence.borrow_and_update() == CadenceRequest::Run {
                return !self.shutdown.is_cancelled();
            }
            debug!("Cadence paused");
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return false,
                changed = self.cadence.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }
}

// =============================================================================
// Polling
// =============================================================================

/// Timer-driven feed: one `tick` request per interval while not paused.
#[derive(Debug, Clone)]
pub struct PollingFeed {
    interval: Duration,
}

impl PollingFeed {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    async fn run_loop(&self, mut ctx: FeedContext) {
        let shutdown = ctx.shutdown_token();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_ms = self.interval.as_millis() as u64, "Polling feed started");

        loop {
            // The first tick completes immediately.
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let was_paused = ctx.is_paused();
            if !ctx.wait_for_run().await {
                break;
            }
            ctx.spawn_fetch(FetchRequest::Tick);
            if was_paused {
                // Resume on a fresh period instead of firing the overdue tick.
                ticker.reset();
            }
        }

        info!("Polling feed stopped");
    }
}

impl UpdateFeed for PollingFeed {
    fn run(&self, ctx: FeedContext) -> BoxFuture<'_, ()> {
        Box::pin(self.run_loop(ctx))
    }

    fn name(&self) -> &'static str {
        "poll"
    }
}

/// A feed that does nothing; snapshots only arrive through manual calls.
#[derive(Debug, Clone, Default)]
pub struct ManualFeed;

impl UpdateFeed for ManualFeed {
    fn run(&self, ctx: FeedContext) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            ctx.shutdown.cancelled().await;
        })
    }

    fn name(&self) -> &'static str {
        "manual"
    }
}

pub(crate) fn log_feed_outcome(feed: &str, result: &Result<FetchOutcome, SyncError>) {
    match result {
        Ok(outcome) => debug!(feed, outcome = ?outcome, "Feed fetch finished"),
        Err(e) if e.is_cancelled() => debug!(feed, "Feed fetch cancelled"),
        Err(e) => warn!(feed, error = %e, "Feed fetch failed"),
    }
}
