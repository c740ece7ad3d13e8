//! Alert feed configuration.

use std::collections::BTreeSet;

use crate::model::Severity;

/// Predictions below this probability are hidden unless a severity filter is active.
pub const DEFAULT_PROBABILITY_FLOOR: f64 = 0.3;
/// Predictions shown in high-risk-only mode.
pub const DEFAULT_HIGH_RISK_CAP: usize = 5;
/// Predictions shown in show-all mode.
pub const DEFAULT_SHOW_ALL_CAP: usize = 15;

/// How many predictions the view presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    HighRiskOnly,
    ShowAll,
}

#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub probability_floor: f64,
    pub high_risk_cap: usize,
    pub show_all_cap: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            probability_floor: DEFAULT_PROBABILITY_FLOOR,
            high_risk_cap: DEFAULT_HIGH_RISK_CAP,
            show_all_cap: DEFAULT_SHOW_ALL_CAP,
        }
    }
}

impl AlertConfig {
    pub fn with_probability_floor(mut self, floor: f64) -> Self {
        self.probability_floor = floor;
        self
    }

    pub fn cap(&self, mode: DisplayMode) -> usize {
        match mode {
            DisplayMode::HighRiskOnly => self.high_risk_cap,
            DisplayMode::ShowAll => self.show_all_cap,
        }
    }
}

/// Operator-selected view filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFilter {
    pub mode: DisplayMode,
    /// When non-empty, predictions of these severities are shown regardless
    /// of the probability floor, and no others.
    pub severities: BTreeSet<Severity>,
}

impl AlertFilter {
    pub fn show_all() -> Self {
        Self {
            mode: DisplayMode::ShowAll,
            ..Self::default()
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severities.insert(severity);
        self
    }

    pub fn has_severity_filter(&self) -> bool {
        !self.severities.is_empty()
    }
}
