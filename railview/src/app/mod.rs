//! Dashboard bootstrap and lifecycle management.
//!
//! [`DashboardApp`] wires the sync client, motion tracker and conflict
//! aggregator together and drives them from one frame loop.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DashboardApp                          │
//! │                                                              │
//! │  SyncClient ──watch──► frame loop ──► MotionTracker.resync   │
//! │      ▲                     │     └──► ConflictAggregator      │
//! │      │ pause/resume        └────────► MotionTracker.advance  │
//! │  CadenceControl ◄──────── ConflictAggregator (freeze)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each frame applies any newly published snapshot before advancing motion,
//! so positions read after a frame are never computed against a stale route.
//!
//! # Example
//!
//! ```ignore
//! use railview::app::{AppConfig, DashboardApp};
//!
//! let app = DashboardApp::connect(AppConfig::default())?;
//! app.start_cadence()?;
//!
//! for position in app.positions() {
//!     println!("{} at {:.4},{:.4}", position.train_id, position.lat, position.lon);
//! }
//!
//! app.shutdown().await;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::{DashboardApp, DashboardStatus, Inspection};
pub use config::AppConfig;
pub use error::AppError;
