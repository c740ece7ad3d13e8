//! Motion tracker configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default number of consecutive snapshots a train may be missing before eviction.
pub const DEFAULT_EVICTION_GRACE: u32 = 3;

/// Default animation frame rate.
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Default fraction of the gap to the authoritative position closed per snapshot.
pub const DEFAULT_BLEND_FACTOR: f64 = 0.5;

/// Default gap (in segments) beyond which resync snaps instead of blending.
pub const DEFAULT_SNAP_DISTANCE_SEGMENTS: f64 = 2.0;

/// What happens when a train runs off the end of its route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustionPolicy {
    /// Hold the train at the final stop and mark it stopped.
    #[default]
    Clamp,
    /// Send the train back to the start of its route.
    Loop,
}

impl fmt::Display for ExhaustionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhaustionPolicy::Clamp => write!(f, "clamp"),
            ExhaustionPolicy::Loop => write!(f, "loop"),
        }
    }
}

impl FromStr for ExhaustionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" | "stop" => Ok(ExhaustionPolicy::Clamp),
            "loop" => Ok(ExhaustionPolicy::Loop),
            other => Err(format!(
                "unknown exhaustion policy '{}' (expected clamp or loop)",
                other
            )),
        }
    }
}

/// Configuration for the motion tracker.
#[derive(Debug, Clone)]
pub struct MotionConfig {
    /// Consecutive snapshots a train may be absent before its record is dropped.
    pub eviction_grace: u32,
    /// Route exhaustion policy.
    pub exhaustion: ExhaustionPolicy,
    /// Fraction of the forward gap closed on each resync, in `(0, 1]`.
    pub blend_factor: f64,
    /// Forward gaps larger than this (in segments) snap immediately.
    pub snap_distance_segments: f64,
    /// Animation frames per second.
    pub frame_rate: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            eviction_grace: DEFAULT_EVICTION_GRACE,
            exhaustion: ExhaustionPolicy::default(),
            blend_factor: DEFAULT_BLEND_FACTOR,
            snap_distance_segments: DEFAULT_SNAP_DISTANCE_SEGMENTS,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl MotionConfig {
    /// Interval between animation frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64)
    }

    pub fn with_eviction_grace(mut self, grace: u32) -> Self {
        self.eviction_grace = grace;
        self
    }

    pub fn with_exhaustion(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion = policy;
        self
    }

    pub fn with_blend_factor(mut self, factor: f64) -> Self {
        self.blend_factor = factor;
        self
    }

    pub(crate) fn effective_grace(&self) -> u32 {
        self.eviction_grace.max(1)
    }

    pub(crate) fn effective_blend(&self) -> f64 {
        if self.blend_factor.is_finite() {
            self.blend_factor.clamp(0.0, 1.0)
        } else {
            DEFAULT_BLEND_FACTOR
        }
    }
}
