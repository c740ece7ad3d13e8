//! Conflicts: predicted risks and detected incidents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Which stream a conflict arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSource {
    /// Forward-looking, probabilistic estimate.
    #[default]
    Prediction,
    /// Confirmed by deterministic rules.
    Detection,
}

impl fmt::Display for ConflictSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictSource::Prediction => write!(f, "prediction"),
            ConflictSource::Detection => write!(f, "detection"),
        }
    }
}

/// Conflict severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "low_risk" | "safe" => Ok(Severity::Low),
            "medium" | "moderate" => Ok(Severity::Medium),
            "high" | "high_risk" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// A conflict between trains, keyed by [`Conflict::conflict_id`].
///
/// A detection and a prediction describing the same real-world event are
/// separate conflicts with separate ids; nothing correlates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub conflict_id: String,

    /// Overwritten from the array the conflict arrived in when a snapshot is normalized.
    #[serde(default)]
    pub source: ConflictSource,

    #[serde(default)]
    pub conflict_type: String,

    /// Severity as sent by the server. `None` when absent or unrecognised,
    /// in which case it is derived from `probability` during aggregation.
    #[serde(default, deserialize_with = "lenient_severity")]
    pub severity: Option<Severity>,

    /// Probability in `[0, 1]`.
    #[serde(default, deserialize_with = "unit_interval")]
    pub probability: f64,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub location_type: Option<String>,

    /// Ids of the trains involved. Duplicates are removed on normalization.
    #[serde(default)]
    pub involved_trains: Vec<String>,

    #[serde(default)]
    pub explanation: String,

    #[serde(default)]
    pub timestamp: String,

    /// How far ahead a prediction looks, in minutes.
    #[serde(default)]
    pub prediction_horizon_min: Option<i64>,

    /// Free-text resolution hints attached by the server.
    #[serde(default)]
    pub resolution_suggestions: Vec<String>,

    #[serde(default)]
    pub lat: Option<f64>,

    #[serde(default)]
    pub lon: Option<f64>,
}

impl Conflict {
    /// Create a conflict with the given id, source and probability.
    pub fn new(conflict_id: impl Into<String>, source: ConflictSource, probability: f64) -> Self {
        Self {
            conflict_id: conflict_id.into(),
            source,
            conflict_type: String::new(),
            severity: None,
            probability: clamp_probability(probability),
            location: String::new(),
            location_type: None,
            involved_trains: Vec::new(),
            explanation: String::new(),
            timestamp: String::new(),
            prediction_horizon_min: None,
            resolution_suggestions: Vec::new(),
            lat: None,
            lon: None,
        }
    }

    /// Builder-style severity override.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Builder-style involved trains.
    pub fn with_trains<I, S>(mut self, trains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.involved_trains = trains.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_detection(&self) -> bool {
        self.source == ConflictSource::Detection
    }

    pub(crate) fn normalize(&mut self, source: ConflictSource) {
        self.source = source;
        let mut seen = std::collections::HashSet::new();
        self.involved_trains.retain(|id| seen.insert(id.clone()));
    }
}

fn clamp_probability(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn unit_interval<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(clamp_probability(
        Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0),
    ))
}

fn lenient_severity<'de, D>(deserializer: D) -> Result<Option<Severity>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}
