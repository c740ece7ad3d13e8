//! Sync client configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default API base of the simulation server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8002/api";

/// Default cadence between polled ticks, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1500;

/// Default request timeout, in milliseconds. Same order as the tick interval.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1500;

/// Default delay before reconnecting a closed push channel, in seconds.
pub const DEFAULT_RECONNECT_BACKOFF_SECS: u64 = 5;

/// How new snapshots reach the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedMode {
    /// Timer-driven `tick` requests.
    #[default]
    Poll,
    /// Server-pushed snapshots over a WebSocket.
    Push,
}

impl fmt::Display for FeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedMode::Poll => write!(f, "poll"),
            FeedMode::Push => write!(f, "push"),
        }
    }
}

impl FromStr for FeedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "poll" | "polling" => Ok(FeedMode::Poll),
            "push" | "websocket" | "ws" => Ok(FeedMode::Push),
            other => Err(format!("unknown transport '{}' (expected poll or push)", other)),
        }
    }
}

/// Configuration for the sync client and its feeds.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// API base for request/response calls.
    pub base_url: String,
    /// WebSocket URL for push mode. Empty means derived from `base_url`.
    pub push_url: String,
    pub mode: FeedMode,
    pub tick_interval: Duration,
    pub request_timeout: Duration,
    pub reconnect_backoff: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            push_url: String::new(),
            mode: FeedMode::default(),
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            reconnect_backoff: Duration::from_secs(DEFAULT_RECONNECT_BACKOFF_SECS),
        }
    }
}

impl SyncConfig {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_mode(mut self, mode: FeedMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The push endpoint: the configured URL, or `ws(s)://<base>/ws`.
    pub fn effective_push_url(&self) -> String {
        if !self.push_url.is_empty() {
            return self.push_url.clone();
        }
        let base = self.base_url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}/ws", base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.base_url, "http://localhost:8002/api");
        assert_eq!(config.mode, FeedMode::Poll);
        assert_eq!(config.tick_interval, Duration::from_millis(1500));
        assert_eq!(config.reconnect_backoff, Duration::from_secs(5));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Push".parse::<FeedMode>(), Ok(FeedMode::Push));
        assert_eq!("poll".parse::<FeedMode>(), Ok(FeedMode::Poll));
        assert!("carrier-pigeon".parse::<FeedMode>().is_err());
    }

    #[test]
    fn test_push_url_derived_from_base() {
        let config = SyncConfig::default();
        assert_eq!(config.effective_push_url(), "ws://localhost:8002/api/ws");

        let config = SyncConfig::default().with_base_url("https://rail.example/api/");
        assert_eq!(config.effective_push_url(), "wss://rail.example/api/ws");

        let config = SyncConfig {
            push_url: "ws://other:9000/live".to_string(),
            ..SyncConfig::default()
        };
        assert_eq!(config.effective_push_url(), "ws://other:9000/live");
    }
}
