//! Linear interpolation along multi-stop routes.

use crate::model::RouteStop;

/// Largest progress value strictly below 1.0.
///
/// Used when a train must be held at the very end of a segment without
/// violating the `progress < 1` invariant.
pub const LAST_PROGRESS: f64 = 1.0 - f64::EPSILON;

/// A geographic point on a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// True when the route has fewer than two stops and no motion is possible.
    pub stationary: bool,
}

impl RoutePoint {
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Index of the last valid segment, or `None` when the route cannot be travelled.
pub fn last_segment(route: &[RouteStop]) -> Option<usize> {
    if route.len() < 2 {
        None
    } else {
        Some(route.len() - 1)
    }
}

/// Position at `progress` along segment `segment_index`.
///
/// # Panics
///
/// Panics on contract violations, which indicate a broken invariant upstream:
/// an empty route, a segment index outside `[1, route.len() - 1]`, or a
/// progress outside `[0, 1)`. A route with a single stop returns that stop
/// flagged as stationary regardless of the other arguments.
pub fn position(route: &[RouteStop], segment_index: usize, progress: f64) -> RoutePoint {
    assert!(!route.is_empty(), "cannot interpolate on an empty route");

    if route.len() < 2 {
        let stop = &route[0];
        return RoutePoint {
            lat: stop.lat,
            lon: stop.lon,
            stationary: true,
        };
    }

    assert!(
        (1..route.len()).contains(&segment_index),
        "segment index {} outside [1, {}]",
        segment_index,
        route.len() - 1
    );
    assert!(
        (0.0..1.0).contains(&progress),
        "progress {} outside [0, 1)",
        progress
    );

    let from = &route[segment_index - 1];
    let to = &route[segment_index];

    RoutePoint {
        lat: from.lat + (to.lat - from.lat) * progress,
        lon: from.lon + (to.lon - from.lon) * progress,
        stationary: false,
    }
}

/// Cumulative distance from the origin to each stop, in kilometres.
///
/// Malformed distances (non-finite or negative) contribute zero, so the
/// result is always non-decreasing.
pub fn cumulative_km(route: &[RouteStop]) -> Vec<f64> {
    let mut total = 0.0;
    route
        .iter()
        .enumerate()
        .map(|(i, stop)| {
            if i > 0 {
                let d = stop.distance_from_previous_km;
                if d.is_finite() && d > 0.0 {
                    total += d;
                }
            }
            total
        })
        .collect()
}

/// Convert a distance along the route into `(segment_index, progress)`.
///
/// Returns `None` for routes shorter than two stops or a non-finite distance.
/// Distances before the origin clamp to the start; distances past the end clamp
/// to [`LAST_PROGRESS`] on the last segment.
pub fn locate_km(route: &[RouteStop], km: f64) -> Option<(usize, f64)> {
    let last = last_segment(route)?;
    if !km.is_finite() {
        return None;
    }

    let cumulative = cumulative_km(route);
    if km <= 0.0 {
        return Some((1, 0.0));
    }

    for segment in 1..=last {
        let start = cumulative[segment - 1];
        let end = cumulative[segment];
        if km < end {
            let length = end - start;
            let progress = if length > 0.0 { (km - start) / length } else { 0.0 };
            return Some((segment, progress.clamp(0.0, LAST_PROGRESS)));
        }
    }

    Some((last, LAST_PROGRESS))
}
