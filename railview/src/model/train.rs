//! Trains as reported by the server.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::RouteStop;

/// Movement status reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrainStatus {
    /// The train is running between or through stations.
    #[default]
    Moving,
    /// The train is held at a station or has finished its route.
    Stopped,
}

impl TrainStatus {
    /// Parse the server's status string.
    ///
    /// The server uses a richer vocabulary than the dashboard needs; anything
    /// that is not explicitly running is shown as stopped.
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "moving" | "running" => TrainStatus::Moving,
            _ => TrainStatus::Stopped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrainStatus::Moving => "moving",
            TrainStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for TrainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TrainStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TrainStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| TrainStatus::from_wire(&s)).unwrap_or_default())
    }
}

/// A train in one snapshot. Identity is [`Train::id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    #[serde(rename = "train_id", alias = "id")]
    pub id: String,

    /// Service category (regional, intercity, freight, ...).
    #[serde(rename = "train_type", alias = "type", default)]
    pub kind: String,

    /// Ordered stops. Immutable for a given id within a session.
    #[serde(default)]
    pub route: Vec<RouteStop>,

    #[serde(default)]
    pub current_station: Option<String>,

    #[serde(default)]
    pub next_station: Option<String>,

    /// Edge (track section) the train currently occupies, if between stations.
    #[serde(default)]
    pub current_edge: Option<String>,

    /// Index into `route` of the last stop reached.
    #[serde(default)]
    pub current_stop_index: Option<usize>,

    /// Distance travelled along the route from its origin, in kilometres.
    #[serde(default)]
    pub position_km: Option<f64>,

    /// Accumulated delay in whole seconds.
    #[serde(default, deserialize_with = "delay_seconds")]
    pub delay_sec: u64,

    /// Nominal speed in km/h, never negative.
    #[serde(default, deserialize_with = "super::non_negative")]
    pub speed_kmh: f64,

    #[serde(default)]
    pub status: TrainStatus,

    /// Server-side position, informational only.
    #[serde(default)]
    pub lat: Option<f64>,

    #[serde(default)]
    pub lon: Option<f64>,
}

impl Train {
    /// Create a moving train with the given route. Mostly useful in tests.
    pub fn new(id: impl Into<String>, route: Vec<RouteStop>, speed_kmh: f64) -> Self {
        Self {
            id: id.into(),
            kind: String::new(),
            route,
            current_station: None,
            next_station: None,
            current_edge: None,
            current_stop_index: None,
            position_km: None,
            delay_sec: 0,
            speed_kmh: speed_kmh.max(0.0),
            status: TrainStatus::Moving,
            lat: None,
            lon: None,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.status == TrainStatus::Moving
    }

    /// Index of the stop with the given name, if it is on this train's route.
    pub fn stop_index(&self, station: &str) -> Option<usize> {
        self.route.iter().position(|stop| stop.name == station)
    }
}

/// The server reports delay as a float; the dashboard works in whole seconds.
fn delay_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    if value.is_finite() && value > 0.0 {
        Ok(value.round() as u64)
    } else {
        Ok(0)
    }
}
