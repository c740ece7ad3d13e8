//! Application configuration for `DashboardApp`.

use crate::alerts::AlertConfig;
use crate::config::ConfigFile;
use crate::motion::MotionConfig;
use crate::sync::SyncConfig;

/// Everything needed to bootstrap the dashboard core.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub sync: SyncConfig,
    pub motion: MotionConfig,
    pub alerts: AlertConfig,
}

impl AppConfig {
    pub fn from_config_file(file: &ConfigFile) -> Self {
        Self {
            sync: file.sync_config(),
            motion: file.motion.clone(),
            alerts: file.alerts.clone(),
        }
    }
}
