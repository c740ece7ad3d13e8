//! Shared setup for commands that talk to the simulation server.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use railview::app::{AppConfig, DashboardApp};
use railview::config::{config_file_path, ConfigFile};
use railview::logging::{init_logging, LogGuard};
use tokio::runtime::Runtime;
use tracing::info;

use crate::commands::common::ConnectArgs;
use crate::error::CliError;

/// Loads configuration, installs logging and owns the async runtime.
pub struct CliRunner {
    config: ConfigFile,
    app_config: AppConfig,
    runtime: Runtime,
    _log_guard: LogGuard,
}

impl CliRunner {
    /// Resolve settings as CLI > config file > defaults.
    pub fn new(args: &ConnectArgs) -> Result<Self, CliError> {
        let config = resolve_config(&config_file_path(), args)?;

        let log_guard = init_logging(&config.logging.level, config.logging.file.as_deref())?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::Runtime(e.to_string()))?;

        let app_config = AppConfig::from_config_file(&config);
        Ok(Self {
            config,
            app_config,
            runtime,
            _log_guard: log_guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            version = railview::VERSION,
            base_url = %self.app_config.sync.base_url,
            transport = %self.app_config.sync.mode,
            "railview starting"
        );
    }

    /// Connect a dashboard, run `f` against it, then shut it down whatever
    /// `f` returned.
    pub fn with_dashboard<F, Fut, T>(&self, f: F) -> Result<T, CliError>
    where
        F: FnOnce(Arc<DashboardApp>) -> Fut,
        Fut: Future<Output = Result<T, CliError>>,
    {
        let app_config = self.app_config.clone();
        self.runtime.block_on(async move {
            let app = Arc::new(DashboardApp::connect(app_config)?);
            let result = f(Arc::clone(&app)).await;
            app.shutdown().await;
            result
        })
    }
}

/// Load the file at `path` and apply the flag overrides.
///
/// An invalid file is an error rather than a silent fallback to defaults,
/// which would point commands at the wrong server.
fn resolve_config(path: &Path, args: &ConnectArgs) -> Result<ConfigFile, CliError> {
    let mut config = ConfigFile::load_from(path)
        .map_err(|e| CliError::Config(format!("{} (in {})", e, path.display())))?;
    args.apply_to(&mut config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        let config = resolve_config(&path, &ConnectArgs::default()).unwrap();
        assert_eq!(config.server.base_url, ConfigFile::default().server.base_url);
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(
            &path,
            "[server]\nbase_url = http://sim:9000/api\n\n[sync]\ntick_interval_ms = abc\n",
        )
        .unwrap();

        match resolve_config(&path, &ConnectArgs::default()) {
            Err(CliError::Config(msg)) => {
                assert!(msg.contains("sync.tick_interval_ms"));
                assert!(msg.contains("abc"));
                assert!(msg.contains("config.ini"));
            }
            other => panic!("expected a config error, got {:?}", other.map(|c| c.server)),
        }
    }

    #[test]
    fn test_flags_override_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(
            &path,
            "[server]\nbase_url = http://sim:9000/api\ntransport = push\n",
        )
        .unwrap();

        let args = ConnectArgs {
            base_url: Some("http://other:8002/api".to_string()),
            ..Default::default()
        };
        let config = resolve_config(&path, &args).unwrap();
        assert_eq!(config.server.base_url, "http://other:8002/api");
        assert_eq!(config.server.transport.to_string(), "push");
    }
}
