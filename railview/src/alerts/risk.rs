//! Overall network risk level.

use std::fmt;

use super::classify::AlertColour;
use crate::model::Conflict;

/// Network-wide risk derived from the most probable prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverallRisk {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl OverallRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallRisk::Safe => "safe",
            OverallRisk::Low => "low",
            OverallRisk::Medium => "medium",
            OverallRisk::High => "high",
            OverallRisk::Critical => "critical",
        }
    }

    pub fn colour(&self) -> AlertColour {
        match self {
            OverallRisk::Safe | OverallRisk::Low => AlertColour::Green,
            OverallRisk::Medium => AlertColour::Yellow,
            OverallRisk::High => AlertColour::Orange,
            OverallRisk::Critical => AlertColour::Red,
        }
    }
}

impl fmt::Display for OverallRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary shown alongside the alert feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSummary {
    pub level: OverallRisk,
    pub max_probability: f64,
    pub prediction_count: usize,
    /// Predictions at or above 0.5.
    pub high_risk_count: usize,
}

impl Default for RiskSummary {
    fn default() -> Self {
        Self::from_predictions(&[])
    }
}

impl RiskSummary {
    pub fn from_predictions(predictions: &[Conflict]) -> Self {
        let max_probability = predictions
            .iter()
            .map(|p| p.probability)
            .fold(0.0_f64, f64::max);

        let level = if predictions.is_empty() {
            OverallRisk::Safe
        } else if max_probability >= 0.8 {
            OverallRisk::Critical
        } else if max_probability >= 0.5 {
            OverallRisk::High
        } else if max_probability >= 0.3 {
            OverallRisk::Medium
        } else {
            OverallRisk::Low
        };

        Self {
            level,
            max_probability,
            prediction_count: predictions.len(),
            high_risk_count: predictions.iter().filter(|p| p.probability >= 0.5).count(),
        }
    }

    pub fn colour(&self) -> AlertColour {
        self.level.colour()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConflictSource;

    fn predictions(probabilities: &[f64]) -> Vec<Conflict> {
        probabilities
            .iter()
            .enumerate()
            .map(|(i, &p)| Conflict::new(format!("P{}", i), ConflictSource::Prediction, p))
            .collect()
    }

    #[test]
    fn test_empty_is_safe() {
        let summary = RiskSummary::from_predictions(&[]);
        assert_eq!(summary.level, OverallRisk::Safe);
        assert_eq!(summary.colour(), AlertColour::Green);
        assert_eq!(summary.max_probability, 0.0);
    }

    #[test]
    fn test_levels() {
        let level = |p: &[f64]| RiskSummary::from_predictions(&predictions(p)).level;
        assert_eq!(level(&[0.1, 0.2]), OverallRisk::Low);
        assert_eq!(level(&[0.1, 0.3]), OverallRisk::Medium);
        assert_eq!(level(&[0.5]), OverallRisk::High);
        assert_eq!(level(&[0.2, 0.85]), OverallRisk::Critical);
    }

    #[test]
    fn test_counts() {
        let summary = RiskSummary::from_predictions(&predictions(&[0.2, 0.5, 0.9]));
        assert_eq!(summary.prediction_count, 3);
        assert_eq!(summary.high_risk_count, 2);
        assert_eq!(summary.colour(), AlertColour::Red);
    }
}
