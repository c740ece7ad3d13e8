//! Entity Motion Tracker.
//!
//! Keeps one [`MotionState`] per train and advances it on a frame clock
//! between authoritative snapshots, so trains glide along their routes instead
//! of jumping once per tick.
//!
//! # Lifecycle per train
//!
//! ```text
//! Uninitialized --[first snapshot containing id]--> Tracking
//! Tracking --[frame]--> Tracking             (extrapolate by speed)
//! Tracking --[snapshot]--> Tracking          (blend toward authoritative target)
//! Tracking --[absent from `eviction_grace` snapshots]--> Evicted
//! ```
//!
//! Snapshot resync never moves a train backwards along its route unless the
//! server reports that the train is back at its origin. When extrapolation has
//! run ahead of the server, the train is held in place until the next snapshot
//! catches up.

mod config;
mod state;
mod tracker;

pub use config::{ExhaustionPolicy, MotionConfig};
pub use state::MotionState;
pub use tracker::{MotionTracker, MotionWarning, ResyncReport, TrainPosition};
