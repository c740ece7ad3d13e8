//! Conflict Aggregator.
//!
//! Turns a snapshot's `predictions` and `detections` into one ranked,
//! de-duplicated, severity-classified alert feed, and holds that feed stable
//! while an operator inspects an alert.
//!
//! # Ordering
//!
//! 1. Detections, most severe first (never below medium)
//! 2. Predictions at or above the probability floor, most probable first
//!
//! An active severity filter replaces the probability floor. The display cap
//! slices the prediction list for presentation only.

mod aggregator;
mod classify;
mod config;
mod risk;

pub use aggregator::{AlertItem, AlertViewState, ConflictAggregator, InspectionState};
pub use classify::{colour_of, effective_severity, AlertColour, RiskLevel};
pub use config::{
    AlertConfig, AlertFilter, DisplayMode, DEFAULT_HIGH_RISK_CAP, DEFAULT_PROBABILITY_FLOOR,
    DEFAULT_SHOW_ALL_CAP,
};
pub use risk::{OverallRisk, RiskSummary};
