//! Sync Client.
//!
//! Owns the single authoritative [`Snapshot`](crate::model::Snapshot) and the
//! cadence that refreshes it.
//!
//! # Architecture
//!
//! - [`SnapshotTransport`] - request/response access to the server
//!   ([`HttpTransport`] in production)
//! - [`UpdateFeed`] - what drives refreshes while running: [`PollingFeed`]
//!   issues timed `tick` requests, [`PushFeed`] applies server-pushed
//!   snapshots over a WebSocket
//! - [`SyncClient`] - lifecycle, supersession, tick-order guard, status
//! - [`CadenceControl`] - pause/resume signal consumed by the feed
//!
//! # Request discipline
//!
//! ```text
//! fetch(A) ──────────────x (cancelled when B starts)
//!        fetch(B) ───────────────> applied if tick(B) > last applied tick
//! ```
//!
//! Only the most recently initiated request can publish. A completion whose
//! tick does not strictly exceed the last applied tick is dropped.

mod cadence;
mod client;
mod config;
mod error;
mod feed;
mod http;
mod push;
mod transport;

pub use cadence::{CadenceControl, CadenceRequest};
pub use client::{
    ApplyOutcome, FetchOutcome, PublishedSnapshot, SyncClient, SyncStats, SyncStatus,
};
pub use config::{
    FeedMode, SyncConfig, DEFAULT_BASE_URL, DEFAULT_RECONNECT_BACKOFF_SECS,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_TICK_INTERVAL_MS,
};
pub use error::SyncError;
pub use feed::{FeedContext, ManualFeed, PollingFeed, UpdateFeed};
pub use http::HttpTransport;
pub use push::PushFeed;
pub use transport::{BoxFuture, FetchRequest, SnapshotTransport, MAX_MULTI_STEP};
