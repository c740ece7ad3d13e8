//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use railview::alerts::{AlertFilter, AlertViewState};
use railview::config::{ConfigFile, ConfigKey};
use railview::model::Severity;
use railview::motion::TrainPosition;

use crate::error::CliError;

/// Update transport selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum TransportType {
    /// Poll the tick endpoint on a timer
    Poll,
    /// Receive snapshots over a WebSocket
    Push,
}

impl TransportType {
    fn as_config_str(&self) -> &'static str {
        match self {
            TransportType::Poll => "poll",
            TransportType::Push => "push",
        }
    }
}

/// Severity selection for alert filters.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum SeverityArg {
    Low,
    Medium,
    High,
    Critical,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Low => Severity::Low,
            SeverityArg::Medium => Severity::Medium,
            SeverityArg::High => Severity::High,
            SeverityArg::Critical => Severity::Critical,
        }
    }
}

/// Connection and logging overrides accepted by every server command.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectArgs {
    /// Simulation API base URL (e.g., http://localhost:8002/api)
    #[arg(long)]
    pub base_url: Option<String>,

    /// WebSocket URL for push mode (derived from the base URL if unset)
    #[arg(long)]
    pub push_url: Option<String>,

    /// How snapshots are delivered
    #[arg(long, value_enum)]
    pub transport: Option<TransportType>,

    /// Polling interval in milliseconds
    #[arg(long)]
    pub tick_interval_ms: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl ConnectArgs {
    /// Overlay CLI values on the loaded config, validating them the same way
    /// `config set` does.
    pub fn apply_to(&self, config: &mut ConfigFile) -> Result<(), CliError> {
        let overrides = [
            (ConfigKey::ServerBaseUrl, self.base_url.clone()),
            (ConfigKey::ServerPushUrl, self.push_url.clone()),
            (
                ConfigKey::ServerTransport,
                self.transport.map(|t| t.as_config_str().to_string()),
            ),
            (
                ConfigKey::SyncTickIntervalMs,
                self.tick_interval_ms.map(|v| v.to_string()),
            ),
            (
                ConfigKey::SyncRequestTimeoutMs,
                self.timeout_ms.map(|v| v.to_string()),
            ),
            (ConfigKey::LoggingLevel, self.log_level.clone()),
            (
                ConfigKey::LoggingFile,
                self.log_file.as_ref().map(|p| p.display().to_string()),
            ),
        ];

        for (key, value) in overrides {
            if let Some(value) = value {
                key.set(config, &value)?;
            }
        }
        Ok(())
    }
}

/// Build an alert filter from `--show-all` and `--severity` flags.
pub fn alert_filter(show_all: bool, severities: &[SeverityArg]) -> AlertFilter {
    let base = if show_all {
        AlertFilter::show_all()
    } else {
        AlertFilter::default()
    };
    severities
        .iter()
        .fold(base, |filter, s| filter.with_severity((*s).into()))
}

/// Print the alert feed as presented.
pub fn print_alerts(view: &AlertViewState) {
    let tick = view
        .tick
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "Tick {} | Risk: {} (max {:.0}%, {} high-risk of {} predictions){}",
        tick,
        view.risk.level,
        view.risk.max_probability * 100.0,
        view.risk.high_risk_count,
        view.risk.prediction_count,
        if view.frozen { " [frozen]" } else { "" }
    );

    if view.detections.is_empty() && view.total_predictions() == 0 {
        println!("  No active conflicts");
        return;
    }

    for item in view.displayed_detections() {
        println!(
            "  DETECTED  {:<8} {:<10} {}  {}",
            item.severity.as_str(),
            item.id(),
            item.conflict.location,
            item.conflict.involved_trains.join(", ")
        );
    }
    for item in view.displayed_predictions() {
        println!(
            "  {:>3.0}%      {:<8} {:<10} {}  {}",
            item.conflict.probability * 100.0,
            item.severity.as_str(),
            item.id(),
            item.conflict.location,
            item.conflict.involved_trains.join(", ")
        );
    }

    let hidden = view.total_predictions() - view.displayed_predictions().len();
    if hidden > 0 {
        println!("  ... {} more", hidden);
    }
}

/// Print one line per tracked train.
pub fn print_positions(positions: &[TrainPosition]) {
    for p in positions {
        let state = if p.moving {
            "moving"
        } else if p.stationary {
            "at stop"
        } else {
            "held"
        };
        println!(
            "  {:<12} {:>9.5},{:>9.5}  segment {} {:>5.1}%  {}",
            p.train_id,
            p.lat,
            p.lon,
            p.segment_index,
            p.progress * 100.0,
            state
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railview::alerts::DisplayMode;

    #[test]
    fn test_overrides_applied() {
        let args = ConnectArgs {
            base_url: Some("http://sim:9000/api".to_string()),
            transport: Some(TransportType::Push),
            tick_interval_ms: Some(500),
            ..Default::default()
        };
        let mut config = ConfigFile::default();
        args.apply_to(&mut config).unwrap();

        assert_eq!(config.server.base_url, "http://sim:9000/api");
        assert_eq!(config.sync.tick_interval_ms, 500);
        assert_eq!(
            ConfigKey::ServerTransport.get(&config),
            "push".to_string()
        );
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = ConnectArgs {
            log_level: Some("loud".to_string()),
            ..Default::default()
        };
        let mut config = ConfigFile::default();
        assert!(matches!(
            args.apply_to(&mut config),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_alert_filter_from_flags() {
        let filter = alert_filter(true, &[SeverityArg::High, SeverityArg::Critical]);
        assert_eq!(filter.mode, DisplayMode::ShowAll);
        assert!(filter.severities.contains(&Severity::High));
        assert_eq!(filter.severities.len(), 2);

        assert!(!alert_filter(false, &[]).has_severity_filter());
    }
}
