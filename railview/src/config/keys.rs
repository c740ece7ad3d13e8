//! Addressable configuration keys (`section.key`).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::{ConfigError, ConfigFile};
use crate::motion::ExhaustionPolicy;
use crate::sync::FeedMode;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Every setting in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    ServerBaseUrl,
    ServerPushUrl,
    ServerTransport,
    SyncTickIntervalMs,
    SyncRequestTimeoutMs,
    SyncReconnectBackoffSecs,
    MotionFrameRate,
    MotionEvictionGrace,
    MotionExhaustion,
    MotionBlendFactor,
    MotionSnapDistanceSegments,
    AlertsProbabilityFloor,
    AlertsHighRiskCap,
    AlertsShowAllCap,
    LoggingLevel,
    LoggingFile,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 16] = [
        ConfigKey::ServerBaseUrl,
        ConfigKey::ServerPushUrl,
        ConfigKey::ServerTransport,
        ConfigKey::SyncTickIntervalMs,
        ConfigKey::SyncRequestTimeoutMs,
        ConfigKey::SyncReconnectBackoffSecs,
        ConfigKey::MotionFrameRate,
        ConfigKey::MotionEvictionGrace,
        ConfigKey::MotionExhaustion,
        ConfigKey::MotionBlendFactor,
        ConfigKey::MotionSnapDistanceSegments,
        ConfigKey::AlertsProbabilityFloor,
        ConfigKey::AlertsHighRiskCap,
        ConfigKey::AlertsShowAllCap,
        ConfigKey::LoggingLevel,
        ConfigKey::LoggingFile,
    ];

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::ServerBaseUrl | ConfigKey::ServerPushUrl | ConfigKey::ServerTransport => {
                "server"
            }
            ConfigKey::SyncTickIntervalMs
            | ConfigKey::SyncRequestTimeoutMs
            | ConfigKey::SyncReconnectBackoffSecs => "sync",
            ConfigKey::MotionFrameRate
            | ConfigKey::MotionEvictionGrace
            | ConfigKey::MotionExhaustion
            | ConfigKey::MotionBlendFactor
            | ConfigKey::MotionSnapDistanceSegments => "motion",
            ConfigKey::AlertsProbabilityFloor
            | ConfigKey::AlertsHighRiskCap
            | ConfigKey::AlertsShowAllCap => "alerts",
            ConfigKey::LoggingLevel | ConfigKey::LoggingFile => "logging",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ConfigKey::ServerBaseUrl => "base_url",
            ConfigKey::ServerPushUrl => "push_url",
            ConfigKey::ServerTransport => "transport",
            ConfigKey::SyncTickIntervalMs => "tick_interval_ms",
            ConfigKey::SyncRequestTimeoutMs => "request_timeout_ms",
            ConfigKey::SyncReconnectBackoffSecs => "reconnect_backoff_secs",
            ConfigKey::MotionFrameRate => "frame_rate",
            ConfigKey::MotionEvictionGrace => "eviction_grace",
            ConfigKey::MotionExhaustion => "exhaustion",
            ConfigKey::MotionBlendFactor => "blend_factor",
            ConfigKey::MotionSnapDistanceSegments => "snap_distance_segments",
            ConfigKey::AlertsProbabilityFloor => "probability_floor",
            ConfigKey::AlertsHighRiskCap => "high_risk_cap",
            ConfigKey::AlertsShowAllCap => "show_all_cap",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingFile => "file",
        }
    }

    /// `section.key`
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key())
    }

    /// One-line help shown by `config list`.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigKey::ServerBaseUrl => "Simulation API root, e.g. http://host:8002/api",
            ConfigKey::ServerPushUrl => "WebSocket feed; empty derives ws://.../ws from base_url",
            ConfigKey::ServerTransport => "poll (timer-driven ticks) or push (server-driven)",
            ConfigKey::SyncTickIntervalMs => "Delay between polled ticks",
            ConfigKey::SyncRequestTimeoutMs => "A request slower than this counts as failed",
            ConfigKey::SyncReconnectBackoffSecs => "Wait before reopening a closed push feed",
            ConfigKey::MotionFrameRate => "Interpolation frames per second",
            ConfigKey::MotionEvictionGrace => "Snapshots a train may be missing before it is dropped",
            ConfigKey::MotionExhaustion => "At the end of a route: clamp (stop) or loop",
            ConfigKey::MotionBlendFactor => "Share of the gap closed toward the server position",
            ConfigKey::MotionSnapDistanceSegments => "Gaps larger than this many segments snap",
            ConfigKey::AlertsProbabilityFloor => "Hide predictions below this probability",
            ConfigKey::AlertsHighRiskCap => "Predictions shown in the default feed",
            ConfigKey::AlertsShowAllCap => "Predictions shown with --show-all or a severity filter",
            ConfigKey::LoggingLevel => "trace, debug, info, warn or error",
            ConfigKey::LoggingFile => "Log file; empty logs to stderr",
        }
    }

    /// The built-in value used when the file does not set this key.
    pub fn default_value(&self) -> String {
        self.get(&ConfigFile::default())
    }

    /// Current value as it would be written to the file.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ServerBaseUrl => config.server.base_url.clone(),
            ConfigKey::ServerPushUrl => config.server.push_url.clone(),
            ConfigKey::ServerTransport => config.server.transport.to_string(),
            ConfigKey::SyncTickIntervalMs => config.sync.tick_interval_ms.to_string(),
            ConfigKey::SyncRequestTimeoutMs => config.sync.request_timeout_ms.to_string(),
            ConfigKey::SyncReconnectBackoffSecs => config.sync.reconnect_backoff_secs.to_string(),
            ConfigKey::MotionFrameRate => config.motion.frame_rate.to_string(),
            ConfigKey::MotionEvictionGrace => config.motion.eviction_grace.to_string(),
            ConfigKey::MotionExhaustion => config.motion.exhaustion.to_string(),
            ConfigKey::MotionBlendFactor => config.motion.blend_factor.to_string(),
            ConfigKey::MotionSnapDistanceSegments => {
                config.motion.snap_distance_segments.to_string()
            }
            ConfigKey::AlertsProbabilityFloor => config.alerts.probability_floor.to_string(),
            ConfigKey::AlertsHighRiskCap => config.alerts.high_risk_cap.to_string(),
            ConfigKey::AlertsShowAllCap => config.alerts.show_all_cap.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingFile => config
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Validate and store a value.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::ServerBaseUrl => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(self.invalid(value, "expected an http:// or https:// URL"));
                }
                config.server.base_url = value.to_string();
            }
            ConfigKey::ServerPushUrl => {
                if !value.is_empty()
                    && !(value.starts_with("ws://") || value.starts_with("wss://"))
                {
                    return Err(self.invalid(value, "expected a ws:// or wss:// URL"));
                }
                config.server.push_url = value.to_string();
            }
            ConfigKey::ServerTransport => {
                config.server.transport = value
                    .parse::<FeedMode>()
                    .map_err(|reason| self.invalid(value, &reason))?;
            }
            ConfigKey::SyncTickIntervalMs => {
                config.sync.tick_interval_ms = self.positive(value)?;
            }
            ConfigKey::SyncRequestTimeoutMs => {
                config.sync.request_timeout_ms = self.positive(value)?;
            }
            ConfigKey::SyncReconnectBackoffSecs => {
                config.sync.reconnect_backoff_secs = self.positive(value)?;
            }
            ConfigKey::MotionFrameRate => {
                config.motion.frame_rate = self.positive(value)?;
            }
            ConfigKey::MotionEvictionGrace => {
                config.motion.eviction_grace = self.positive(value)?;
            }
            ConfigKey::MotionExhaustion => {
                config.motion.exhaustion = value
                    .parse::<ExhaustionPolicy>()
                    .map_err(|reason| self.invalid(value, &reason))?;
            }
            ConfigKey::MotionBlendFactor => {
                let factor = self.number(value)?;
                if !(factor > 0.0 && factor <= 1.0) {
                    return Err(self.invalid(value, "must be in (0, 1]"));
                }
                config.motion.blend_factor = factor;
            }
            ConfigKey::MotionSnapDistanceSegments => {
                let distance = self.number(value)?;
                if distance <= 0.0 {
                    return Err(self.invalid(value, "must be positive"));
                }
                config.motion.snap_distance_segments = distance;
            }
            ConfigKey::AlertsProbabilityFloor => {
                let floor = self.number(value)?;
                if !(0.0..=1.0).contains(&floor) {
                    return Err(self.invalid(value, "must be in [0, 1]"));
                }
                config.alerts.probability_floor = floor;
            }
            ConfigKey::AlertsHighRiskCap => {
                config.alerts.high_risk_cap = self.positive(value)?;
            }
            ConfigKey::AlertsShowAllCap => {
                config.alerts.show_all_cap = self.positive(value)?;
            }
            ConfigKey::LoggingLevel => {
                let level = value.to_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(self.invalid(value, "expected trace, debug, info, warn or error"));
                }
                config.logging.level = level;
            }
            ConfigKey::LoggingFile => {
                config.logging.file = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn number(&self, value: &str) -> Result<f64, ConfigError> {
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(self.invalid(value, "expected a number")),
        }
    }

    fn positive<T>(&self, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + Default,
    {
        match value.parse::<T>() {
            Ok(n) if n > T::default() => Ok(n),
            _ => Err(self.invalid(value, "expected a positive integer")),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
