//! Configuration file handling.
//!
//! Settings live in an INI file at `<config_dir>/railview/config.ini`. Every
//! key has a default, so a missing file is the same as an empty one. Command
//! line flags override file values.
//!
//! ```ini
//! [server]
//! base_url = http://localhost:8002/api
//! transport = poll
//!
//! [sync]
//! tick_interval_ms = 1500
//!
//! [alerts]
//! probability_floor = 0.3
//! ```

mod file;
mod keys;

pub use file::{
    config_file_path, ConfigError, ConfigFile, LoggingSettings, ServerSettings, SyncSettings,
};
pub use keys::ConfigKey;
