//! Route stops.

use serde::{Deserialize, Serialize};

/// One stop on a train's route.
///
/// A route is an ordered sequence of stops; segment `i` (1-based) runs from
/// `route[i - 1]` to `route[i]` and is `route[i].distance_from_previous_km`
/// long. The first stop's distance is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    /// Station name.
    #[serde(rename = "station_name", alias = "name", default)]
    pub name: String,

    /// Latitude in degrees. NaN when the server sent no usable value.
    #[serde(default = "super::nan", deserialize_with = "super::f64_or_nan")]
    pub lat: f64,

    /// Longitude in degrees. NaN when the server sent no usable value.
    #[serde(default = "super::nan", deserialize_with = "super::f64_or_nan")]
    pub lon: f64,

    /// Distance from the previous stop in kilometres.
    #[serde(default = "super::nan", deserialize_with = "super::f64_or_nan")]
    pub distance_from_previous_km: f64,

    /// Position of the stop in the route, if the server supplied it.
    #[serde(rename = "station_order", alias = "order", default)]
    pub order: Option<u32>,
}

impl RouteStop {
    /// Create a stop.
    pub fn new(name: impl Into<String>, lat: f64, lon: f64, distance_from_previous_km: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
            distance_from_previous_km,
            order: None,
        }
    }

    /// Whether this stop has finite coordinates.
    pub fn has_position(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Whether the segment ending at this stop can be travelled at finite speed.
    ///
    /// Requires finite coordinates and a strictly positive finite distance.
    pub fn is_travellable(&self) -> bool {
        self.has_position()
            && self.distance_from_previous_km.is_finite()
            && self.distance_from_previous_km > 0.0
    }
}
