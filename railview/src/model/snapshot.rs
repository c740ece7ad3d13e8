//! Authoritative simulation snapshots.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{Conflict, ConflictSource, Train};

/// One atomic view of the whole simulation at a tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Simulated wall-clock time as ISO-8601.
    #[serde(default)]
    pub simulation_time: String,

    /// Monotonic tick counter. Resets to zero only when the server restarts the run.
    pub tick_number: u64,

    #[serde(default)]
    pub trains: Vec<Train>,

    #[serde(default)]
    pub predictions: Vec<Conflict>,

    #[serde(default)]
    pub detections: Vec<Conflict>,

    /// Server statistics, passed through untouched.
    #[serde(default)]
    pub statistics: serde_json::Map<String, serde_json::Value>,
}

impl Snapshot {
    /// Create an empty snapshot at the given tick.
    pub fn at_tick(tick_number: u64) -> Self {
        Self {
            tick_number,
            ..Default::default()
        }
    }

    /// Decode a snapshot from JSON bytes and normalize it.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let snapshot: Snapshot = serde_json::from_slice(bytes)?;
        Ok(snapshot.normalized())
    }

    /// Force every conflict's `source` to match the array it arrived in,
    /// de-duplicate involved train ids and number unordered route stops by
    /// their position.
    pub fn normalized(mut self) -> Self {
        for train in &mut self.trains {
            for (i, stop) in train.route.iter_mut().enumerate() {
                stop.order.get_or_insert(i as u32);
            }
        }
        for conflict in &mut self.predictions {
            conflict.normalize(ConflictSource::Prediction);
        }
        for conflict in &mut self.detections {
            conflict.normalize(ConflictSource::Detection);
        }
        self
    }

    /// Parse `simulation_time`. Accepts naive ISO-8601 (as the server sends it)
    /// and RFC 3339 with an offset.
    pub fn simulation_datetime(&self) -> Option<NaiveDateTime> {
        let raw = self.simulation_time.trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.naive_utc())
            })
    }

    pub fn train(&self, id: &str) -> Option<&Train> {
        self.trains.iter().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const STATE_JSON: &str = r#"{
        "simulation_time": "2024-01-15T08:30:00.250000",
        "tick_number": 12,
        "trains": [{"train_id": "REG_1", "route": []}],
        "predictions": [{"conflict_id": "P1", "source": "detection", "probability": 0.5}],
        "detections": [{"conflict_id": "D1", "probability": 1.0}],
        "statistics": {"active_trains": 1},
        "unknown_field": true
    }"#;

    #[test]
    fn test_from_slice_normalizes_sources() {
        let snapshot = Snapshot::from_slice(STATE_JSON.as_bytes()).unwrap();
        assert_eq!(snapshot.tick_number, 12);
        assert_eq!(snapshot.predictions[0].source, ConflictSource::Prediction);
        assert_eq!(snapshot.detections[0].source, ConflictSource::Detection);
        assert_eq!(snapshot.statistics["active_trains"], 1);
        assert!(snapshot.train("REG_1").is_some());
    }

    #[test]
    fn test_simulation_datetime_naive() {
        let snapshot = Snapshot::from_slice(STATE_JSON.as_bytes()).unwrap();
        let time = snapshot.simulation_datetime().unwrap();
        assert_eq!(time.hour(), 8);
        assert_eq!(time.minute(), 30);
    }

    #[test]
    fn test_simulation_datetime_rfc3339() {
        let snapshot = Snapshot {
            simulation_time: "2024-01-15T08:30:00+01:00".to_string(),
            ..Snapshot::at_tick(0)
        };
        assert_eq!(snapshot.simulation_datetime().unwrap().hour(), 7);
    }

    #[test]
    fn test_route_order_defaults_to_position() {
        let json = br#"{"tick_number": 1, "trains": [{"train_id": "R1", "route": [
            {"station_name": "A", "lat": 45.0, "lon": 9.0, "distance_from_previous_km": 0},
            {"station_name": "B", "lat": 45.1, "lon": 9.1, "distance_from_previous_km": 5, "station_order": 7}
        ]}]}"#;
        let snapshot = Snapshot::from_slice(json).unwrap();
        let route = &snapshot.train("R1").unwrap().route;
        assert_eq!(route[0].order, Some(0));
        assert_eq!(route[1].order, Some(7));
    }

    #[test]
    fn test_missing_tick_is_rejected() {
        assert!(Snapshot::from_slice(br#"{"trains": []}"#).is_err());
    }
}
