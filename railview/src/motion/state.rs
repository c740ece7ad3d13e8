//! Per-train motion record.

use crate::route::LAST_PROGRESS;

/// The tracker's private view of where a train is between ticks.
///
/// Invariant: when the train's route has at least two stops,
/// `segment_index` is in `[1, route.len() - 1]` and `progress` is in `[0, 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionState {
    pub train_id: String,
    /// 1-based segment index into the route.
    pub segment_index: usize,
    /// Fraction of the current segment covered, in `[0, 1)`.
    pub progress: f64,
    /// Tick of the last snapshot that re-anchored this record.
    pub last_sync_tick: u64,
    /// Nominal speed from the last snapshot.
    pub speed_kmh: f64,
    /// The server reports the train as stopped.
    pub stopped: bool,
    /// The train ran off the end of its route under the clamp policy.
    pub exhausted: bool,
    /// Extrapolation ran ahead of the server; hold until the next snapshot.
    pub held: bool,
    pub(crate) missed_snapshots: u32,
}

impl MotionState {
    pub(crate) fn new(train_id: impl Into<String>, tick: u64) -> Self {
        Self {
            train_id: train_id.into(),
            segment_index: 1,
            progress: 0.0,
            last_sync_tick: tick,
            speed_kmh: 0.0,
            stopped: false,
            exhausted: false,
            held: false,
            missed_snapshots: 0,
        }
    }

    /// Whether frame ticks move this train.
    pub fn is_advancing(&self) -> bool {
        !self.stopped && !self.exhausted && !self.held && self.speed_kmh > 0.0
    }

    /// Whether the train is shown as stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped || self.exhausted
    }

    /// Consecutive snapshots this train has been missing from.
    pub fn missed_snapshots(&self) -> u32 {
        self.missed_snapshots
    }

    /// Position along the route as a single number: `segment_index - 1 + progress`.
    pub(crate) fn route_coordinate(&self) -> f64 {
        (self.segment_index - 1) as f64 + self.progress
    }

    /// Set the position from a route coordinate, clamped to `[0, last_segment)`.
    pub(crate) fn set_route_coordinate(&mut self, coordinate: f64, last_segment: usize) {
        let max = last_segment as f64 - (1.0 - LAST_PROGRESS);
        let coordinate = if coordinate.is_finite() {
            coordinate.clamp(0.0, max)
        } else {
            0.0
        };
        let segment = (coordinate.floor() as usize + 1).clamp(1, last_segment);
        self.segment_index = segment;
        self.progress = (coordinate - (segment - 1) as f64).clamp(0.0, LAST_PROGRESS);
    }
}
