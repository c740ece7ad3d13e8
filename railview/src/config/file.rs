//! The INI-backed configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use super::keys::ConfigKey;
use crate::alerts::AlertConfig;
use crate::motion::MotionConfig;
use crate::sync::{
    FeedMode, SyncConfig, DEFAULT_BASE_URL, DEFAULT_RECONNECT_BACKOFF_SECS,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_TICK_INTERVAL_MS,
};

/// Errors from loading, saving or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("Failed to write config file {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub base_url: String,
    /// Empty means derived from `base_url`.
    pub push_url: String,
    pub transport: FeedMode,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            push_url: String::new(),
            transport: FeedMode::Poll,
        }
    }
}

/// `[sync]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    pub tick_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub reconnect_backoff_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            reconnect_backoff_secs: DEFAULT_RECONNECT_BACKOFF_SECS,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// All settings, as read from the INI file.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub server: ServerSettings,
    pub sync: SyncSettings,
    pub motion: MotionConfig,
    pub alerts: AlertConfig,
    pub logging: LoggingSettings,
}

/// Default location of the configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("railview").join("config.ini"))
        .unwrap_or_else(|| PathBuf::from("railview.ini"))
}

impl ConfigFile {
    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_ini(&ini)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Parse INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Read {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for key in ConfigKey::ALL {
            if let Some(value) = ini.get_from(Some(key.section()), key.key()) {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::ALL {
            ini.with_section(Some(key.section()))
                .set(key.key(), key.get(self));
        }
        ini
    }

    /// Save to the default location, creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |message: String| ConfigError::Write {
            path: path.to_path_buf(),
            message,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
            }
        }
        self.to_ini()
            .write_to_file(path)
            .map_err(|e| write_error(e.to_string()))
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            base_url: self.server.base_url.clone(),
            push_url: self.server.push_url.clone(),
            mode: self.server.transport,
            tick_interval: Duration::from_millis(self.sync.tick_interval_ms),
            request_timeout: Duration::from_millis(self.sync.request_timeout_ms),
            reconnect_backoff: Duration::from_secs(self.sync.reconnect_backoff_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::ExhaustionPolicy;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config.server, ServerSettings::default());
        assert_eq!(config.sync.tick_interval_ms, 1500);
    }

    #[test]
    fn test_parse_sections() {
        let config = ConfigFile::parse(
            "[server]\nbase_url = http://rail:9000/api\ntransport = push\n\
             [motion]\nexhaustion = loop\neviction_grace = 5\n\
             [alerts]\nprobability_floor = 0.4\n",
        )
        .unwrap();
        assert_eq!(config.server.base_url, "http://rail:9000/api");
        assert_eq!(config.server.transport, FeedMode::Push);
        assert_eq!(config.motion.exhaustion, ExhaustionPolicy::Loop);
        assert_eq!(config.motion.eviction_grace, 5);
        assert_eq!(config.alerts.probability_floor, 0.4);
        // Untouched keys keep their defaults.
        assert_eq!(config.alerts.high_risk_cap, 5);
    }

    #[test]
    fn test_invalid_value_names_key() {
        let err = ConfigFile::parse("[sync]\ntick_interval_ms = soon\n").unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "sync.tick_interval_ms");
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.server.transport = FeedMode::Push;
        config.logging.file = Some(PathBuf::from("/tmp/railview.log"));
        config.save_to(&path).unwrap();

        let reloaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(reloaded.server.transport, FeedMode::Push);
        assert_eq!(reloaded.logging.file, Some(PathBuf::from("/tmp/railview.log")));
    }

    #[test]
    fn test_sync_config_conversion() {
        let mut config = ConfigFile::default();
        config.sync.request_timeout_ms = 800;
        let sync = config.sync_config();
        assert_eq!(sync.request_timeout, Duration::from_millis(800));
        assert_eq!(sync.reconnect_backoff, Duration::from_secs(5));
    }
}
