//! Railview - live state synchronization for rail operations dashboards
//!
//! This library keeps a local copy of a stepped train simulation in sync with
//! its server, glides each train along its route between ticks, and merges
//! predicted and detected conflicts into one stable alert feed.
//!
//! # Modules
//!
//! - [`route`] - position along a multi-stop route
//! - [`motion`] - per-train extrapolation between ticks
//! - [`sync`] - the authoritative snapshot and its refresh cadence
//! - [`alerts`] - conflict ranking, classification and freeze
//! - [`workflow`] - operator inspection and resolution options
//! - [`app`] - wiring and lifecycle of the above

pub mod alerts;
pub mod app;
pub mod config;
pub mod logging;
pub mod model;
pub mod motion;
pub mod route;
pub mod sync;
pub mod workflow;

/// Crate version, for status output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
