//! Severity and risk classification of individual conflicts.

use std::fmt;

use crate::model::{Conflict, Severity};

/// Probability below which a prediction is considered safe.
pub const SAFE_BELOW: f64 = 0.3;
/// Probability below which a prediction is low risk.
pub const LOW_RISK_BELOW: f64 = 0.5;
/// Probability below which a prediction is high risk; at or above is critical.
pub const HIGH_RISK_BELOW: f64 = 0.8;

/// Risk bucket of a prediction, derived from its probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Safe,
    LowRisk,
    HighRisk,
    Critical,
}

impl RiskLevel {
    pub fn from_probability(probability: f64) -> Self {
        if probability < SAFE_BELOW {
            RiskLevel::Safe
        } else if probability < LOW_RISK_BELOW {
            RiskLevel::LowRisk
        } else if probability < HIGH_RISK_BELOW {
            RiskLevel::HighRisk
        } else {
            RiskLevel::Critical
        }
    }

    /// Severity implied by this bucket when the server sends none.
    pub fn severity(&self) -> Severity {
        match self {
            RiskLevel::Safe => Severity::Low,
            RiskLevel::LowRisk => Severity::Medium,
            RiskLevel::HighRisk => Severity::High,
            RiskLevel::Critical => Severity::Critical,
        }
    }

    pub fn colour(&self) -> AlertColour {
        match self {
            RiskLevel::Safe => AlertColour::Green,
            RiskLevel::LowRisk => AlertColour::Yellow,
            RiskLevel::HighRisk => AlertColour::Orange,
            RiskLevel::Critical => AlertColour::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::LowRisk => "low_risk",
            RiskLevel::HighRisk => "high_risk",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display colour of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertColour {
    Green,
    Yellow,
    Orange,
    Red,
}

impl AlertColour {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertColour::Green => "green",
            AlertColour::Yellow => "yellow",
            AlertColour::Orange => "orange",
            AlertColour::Red => "red",
        }
    }
}

impl fmt::Display for AlertColour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity used for ranking and filtering.
///
/// The server's severity wins when present; otherwise it is derived from the
/// probability bucket. Detections are never below medium.
pub fn effective_severity(conflict: &Conflict) -> Severity {
    let severity = conflict
        .severity
        .unwrap_or_else(|| RiskLevel::from_probability(conflict.probability).severity());
    if conflict.is_detection() {
        severity.max(Severity::Medium)
    } else {
        severity
    }
}

/// Detections are always red; predictions follow their risk bucket.
pub fn colour_of(conflict: &Conflict) -> AlertColour {
    if conflict.is_detection() {
        AlertColour::Red
    } else {
        RiskLevel::from_probability(conflict.probability).colour()
    }
}
