//! The motion tracker: per-train extrapolation and snapshot resync.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tracing::{debug, warn};

use super::config::{ExhaustionPolicy, MotionConfig};
use super::state::MotionState;
use crate::model::{RouteStop, Snapshot, Train, TrainStatus};
use crate::route::{self, last_segment, locate_km, LAST_PROGRESS};

/// Gaps smaller than this (in segments) are treated as "already there".
const COORDINATE_TOLERANCE: f64 = 1e-9;

/// Interpolated position of one train for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainPosition {
    pub train_id: String,
    pub lat: f64,
    pub lon: f64,
    pub segment_index: usize,
    pub progress: f64,
    /// The route has fewer than two stops.
    pub stationary: bool,
    /// The train is currently being advanced by frame ticks.
    pub moving: bool,
}

/// A malformed segment that was passed through as zero-duration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MotionWarning {
    pub train_id: String,
    pub segment_index: usize,
}

/// Outcome of applying one snapshot to the tracker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResyncReport {
    /// Trains seen for the first time.
    pub seeded: usize,
    /// Trains re-anchored from authoritative data.
    pub resynced: usize,
    /// Trains dropped after exceeding the eviction grace.
    pub evicted: Vec<String>,
}

/// Where the server says a train is.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    /// Exact route coordinate.
    Exact(f64),
    /// Somewhere on or after this coordinate within the same segment.
    AtLeast(f64),
}

#[derive(Debug)]
struct TrackedTrain {
    motion: MotionState,
    route: Vec<RouteStop>,
    warned_segments: HashSet<usize>,
}

impl TrackedTrain {
    fn seed(train: &Train, tick: u64) -> Self {
        let mut tracked = Self {
            motion: MotionState::new(train.id.clone(), tick),
            route: train.route.clone(),
            warned_segments: HashSet::new(),
        };
        tracked.update_kinematics(train);

        if let Some(last) = last_segment(&tracked.route) {
            let coordinate = match authoritative_target(train, &tracked.route) {
                Some(Target::Exact(c)) | Some(Target::AtLeast(c)) => c,
                None => 0.0,
            };
            tracked.motion.set_route_coordinate(coordinate, last);
        }
        tracked
    }

    fn update_kinematics(&mut self, train: &Train) {
        self.motion.speed_kmh = train.speed_kmh;
        self.motion.stopped = train.status == TrainStatus::Stopped;
        self.motion.held = false;
    }

    fn resync(&mut self, train: &Train, tick: u64, config: &MotionConfig) {
        self.motion.last_sync_tick = tick;
        self.motion.missed_snapshots = 0;

        // Routes are fixed per session; only adopt one if we never had it.
        if self.route.is_empty() && !train.route.is_empty() {
            self.route = train.route.clone();
        }
        self.update_kinematics(train);

        let Some(last) = last_segment(&self.route) else {
            return;
        };
        let Some(target) = authoritative_target(train, &self.route) else {
            return;
        };

        let current = self.motion.route_coordinate();
        let (target_coordinate, exact) = match target {
            Target::Exact(c) => (c, true),
            Target::AtLeast(c) => (c, false),
        };

        if target_coordinate + COORDINATE_TOLERANCE < current {
            if restarted(train, &self.route, &self.motion) {
                debug!(train_id = %train.id, "Train restarted its route");
                self.motion.exhausted = false;
                self.motion.set_route_coordinate(target_coordinate, last);
                return;
            }
            // Ahead of the server. An inexact target only bounds the start of
            // a segment, so being ahead within that segment is fine.
            let segment_end = target_coordinate.floor() + 1.0;
            if exact || current >= segment_end {
                self.motion.held = true;
            }
            return;
        }

        let gap = target_coordinate - current;
        let next = if gap > config.snap_distance_segments {
            target_coordinate
        } else {
            current + gap * config.effective_blend()
        };
        self.motion.set_route_coordinate(next, last);
        if target_coordinate < last as f64 - COORDINATE_TOLERANCE {
            self.motion.exhausted = false;
        }
    }

    fn segment_travellable(&self, segment: usize) -> bool {
        self.route[segment].is_travellable() && self.route[segment - 1].has_position()
    }

    fn note_malformed(&mut self, segment: usize) {
        if self.warned_segments.insert(segment) {
            warn!(
                train_id = %self.motion.train_id,
                segment,
                "Malformed route segment treated as zero-duration"
            );
        }
    }

    /// Move to the next segment. Returns false if the train is now clamped at
    /// the end of its route.
    fn enter_next_segment(&mut self, policy: ExhaustionPolicy) -> bool {
        let last = self.route.len() - 1;
        if self.motion.segment_index < last {
            self.motion.segment_index += 1;
            self.motion.progress = 0.0;
            return true;
        }

        match policy {
            ExhaustionPolicy::Clamp => {
                self.motion.segment_index = last;
                self.motion.progress = LAST_PROGRESS;
                self.motion.exhausted = true;
                debug!(train_id = %self.motion.train_id, "Route exhausted, holding at final stop");
                false
            }
            ExhaustionPolicy::Loop => {
                self.motion.segment_index = 1;
                self.motion.progress = 0.0;
                debug!(train_id = %self.motion.train_id, "Route exhausted, looping to origin");
                true
            }
        }
    }

    fn advance(&mut self, elapsed_secs: f64, policy: ExhaustionPolicy) {
        if self.route.len() < 2 || !self.motion.is_advancing() {
            return;
        }

        let segment = self.motion.segment_index;
        if self.segment_travellable(segment) {
            let length_km = self.route[segment].distance_from_previous_km;
            let travelled_km = self.motion.speed_kmh / 3600.0 * elapsed_secs;
            self.motion.progress += travelled_km / length_km;
        } else {
            self.note_malformed(segment);
            self.motion.progress = 1.0;
        }

        // Completed segments reset progress; malformed ones are passed through
        // in the same frame. The hop bound stops a fully malformed looping
        // route from spinning.
        let mut hops = 0;
        while self.motion.progress >= 1.0 && hops <= self.route.len() {
            hops += 1;
            if !self.enter_next_segment(policy) {
                break;
            }
            let segment = self.motion.segment_index;
            if !self.segment_travellable(segment) {
                self.note_malformed(segment);
                self.motion.progress = 1.0;
            }
        }
        if self.motion.progress >= 1.0 {
            self.motion.progress = LAST_PROGRESS;
        }
    }

    fn position(&self) -> Option<TrainPosition> {
        if self.route.is_empty() {
            return None;
        }
        let point = route::position(&self.route, self.motion.segment_index, self.motion.progress);
        if !point.is_finite() {
            return None;
        }
        Some(TrainPosition {
            train_id: self.motion.train_id.clone(),
            lat: point.lat,
            lon: point.lon,
            segment_index: self.motion.segment_index,
            progress: self.motion.progress,
            stationary: point.stationary,
            moving: !point.stationary && self.motion.is_advancing(),
        })
    }
}

/// Derive the server's view of a train's route coordinate.
///
/// Station fields fix the segment; `position_km` (distance from the origin)
/// refines progress when it agrees with that segment.
fn authoritative_target(train: &Train, route: &[RouteStop]) -> Option<Target> {
    let last = last_segment(route)?;
    let from_km = train.position_km.and_then(|km| locate_km(route, km));
    let station_index = |name: &Option<String>| {
        name.as_deref()
            .and_then(|n| route.iter().position(|stop| stop.name == n))
    };

    // Held at a known station: exactly at that stop.
    if train.status == TrainStatus::Stopped {
        let at = station_index(&train.current_station).or(train.current_stop_index);
        if let Some(index) = at {
            let index = index.min(last);
            return Some(Target::Exact(index as f64));
        }
    }

    let segment = station_index(&train.next_station)
        .filter(|&i| i >= 1)
        .or_else(|| train.current_stop_index.map(|k| k + 1))
        .or_else(|| station_index(&train.current_station).map(|k| k + 1))
        .map(|s| s.clamp(1, last));

    match (segment, from_km) {
        (Some(segment), Some((km_segment, progress))) if km_segment == segment => {
            Some(Target::Exact((segment - 1) as f64 + progress))
        }
        (Some(segment), _) => Some(Target::AtLeast((segment - 1) as f64)),
        (None, Some((km_segment, progress))) => {
            Some(Target::Exact((km_segment - 1) as f64 + progress))
        }
        (None, None) => None,
    }
}

/// The server explicitly reports the train back at the origin of its
/// tracked route.
fn restarted(train: &Train, route: &[RouteStop], motion: &MotionState) -> bool {
    let origin = route.first().map(|s| s.name.as_str());
    let at_origin = train.current_stop_index == Some(0)
        || (origin.is_some() && train.current_station.as_deref() == origin);
    at_origin && (motion.segment_index > 1 || motion.exhausted)
}

/// Per-train motion records, advanced by frames and re-anchored by snapshots.
#[derive(Debug, Default)]
pub struct MotionTracker {
    config: MotionConfig,
    trains: HashMap<String, TrackedTrain>,
}

impl MotionTracker {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            trains: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Re-anchor every tracked train from an authoritative snapshot.
    ///
    /// Seeds records for new ids, blends existing ones toward the server's
    /// position, and evicts trains missing from `eviction_grace` consecutive
    /// snapshots.
    pub fn resync(&mut self, snapshot: &Snapshot) -> ResyncReport {
        let mut report = ResyncReport::default();
        let mut seen = HashSet::with_capacity(snapshot.trains.len());
        let tick = snapshot.tick_number;

        for train in &snapshot.trains {
            seen.insert(train.id.as_str());
            match self.trains.get_mut(&train.id) {
                Some(tracked) => {
                    tracked.resync(train, tick, &self.config);
                    report.resynced += 1;
                }
                None => {
                    debug!(train_id = %train.id, tick, "Tracking new train");
                    self.trains
                        .insert(train.id.clone(), TrackedTrain::seed(train, tick));
                    report.seeded += 1;
                }
            }
        }

        let grace = self.config.effective_grace();
        self.trains.retain(|id, tracked| {
            if seen.contains(id.as_str()) {
                return true;
            }
            tracked.motion.missed_snapshots += 1;
            if tracked.motion.missed_snapshots >= grace {
                debug!(train_id = %id, grace, "Evicting train missing from snapshots");
                report.evicted.push(id.clone());
                false
            } else {
                true
            }
        });

        report
    }

    /// Advance every moving train by `elapsed` of wall-clock time.
    pub fn advance(&mut self, elapsed: Duration) {
        let elapsed_secs = elapsed.as_secs_f64();
        if elapsed_secs <= 0.0 {
            return;
        }
        let policy = self.config.exhaustion;
        for tracked in self.trains.values_mut() {
            tracked.advance(elapsed_secs, policy);
        }
    }

    /// Interpolated position of one train.
    ///
    /// `None` for unknown ids, empty routes, or segments whose endpoints have
    /// no usable coordinates.
    pub fn position(&self, train_id: &str) -> Option<TrainPosition> {
        self.trains.get(train_id)?.position()
    }

    /// Interpolated positions of all trains that have one, ordered by id.
    pub fn positions(&self) -> Vec<TrainPosition> {
        let mut positions: Vec<_> = self
            .trains
            .values()
            .filter_map(TrackedTrain::position)
            .collect();
        positions.sort_by(|a, b| a.train_id.cmp(&b.train_id));
        positions
    }

    pub fn motion(&self, train_id: &str) -> Option<&MotionState> {
        self.trains.get(train_id).map(|t| &t.motion)
    }

    /// Malformed segments encountered so far.
    pub fn warnings(&self) -> Vec<MotionWarning> {
        let mut warnings: Vec<_> = self
            .trains
            .values()
            .flat_map(|t| {
                t.warned_segments.iter().map(|&segment_index| MotionWarning {
                    train_id: t.motion.train_id.clone(),
                    segment_index,
                })
            })
            .collect();
        warnings.sort_by(|a, b| {
            a.train_id
                .cmp(&b.train_id)
                .then(a.segment_index.cmp(&b.segment_index))
        });
        warnings
    }

    pub fn len(&self) -> usize {
        self.trains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trains.is_empty()
    }

    pub fn contains(&self, train_id: &str) -> bool {
        self.trains.contains_key(train_id)
    }

    /// Drop every motion record.
    pub fn clear(&mut self) {
        self.trains.clear();
    }
}
