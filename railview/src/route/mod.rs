//! Route interpolation.
//!
//! Pure functions that place a point on a train's route. Interpolation is
//! linear in coordinate space, which is accurate enough over the few tens of
//! kilometres between adjacent stations.
//!
//! # Segment addressing
//!
//! ```text
//! route:    [A] ─── seg 1 ──► [B] ─── seg 2 ──► [C]
//! progress:  0.0 ........... 1.0
//! ```
//!
//! Segment `i` is 1-based and joins `route[i - 1]` to `route[i]`.

mod interpolate;

pub use interpolate::{
    cumulative_km, last_segment, locate_km, position, RoutePoint, LAST_PROGRESS,
};
