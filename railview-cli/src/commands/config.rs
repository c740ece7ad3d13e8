//! `railview config` - inspect and edit the INI settings file.
//!
//! Every command reads the file strictly: a value that does not parse is
//! reported with its key instead of being replaced by defaults, so a `set`
//! can never silently rewrite a broken file with built-in values.

use std::fmt::Write as _;
use std::path::Path;

use clap::Subcommand;
use railview::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one setting
    Get {
        /// Setting as section.key (e.g., sync.tick_interval_ms)
        key: String,
    },

    /// Change one setting and save the file
    Set {
        /// Setting as section.key (e.g., server.base_url)
        key: String,

        /// New value, validated before saving
        value: String,
    },

    /// Restore one setting to its built-in default
    Reset {
        /// Setting as section.key (e.g., alerts.probability_floor)
        key: String,
    },

    /// Show every setting with its default and meaning
    List,

    /// Print the settings file location
    Path,
}

pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    let path = config_file_path();
    let output = match command {
        ConfigCommands::Get { key } => get(&path, &key)?,
        ConfigCommands::Set { key, value } => set(&path, &key, &value)?,
        ConfigCommands::Reset { key } => reset(&path, &key)?,
        ConfigCommands::List => list(&load(&path)?),
        ConfigCommands::Path => path.display().to_string(),
    };
    println!("{}", output.trim_end());
    Ok(())
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'railview config list' to see available keys.",
            key
        ))
    })
}

fn load(path: &Path) -> Result<ConfigFile, CliError> {
    ConfigFile::load_from(path)
        .map_err(|e| CliError::Config(format!("{} (in {})", e, path.display())))
}

fn get(path: &Path, key: &str) -> Result<String, CliError> {
    let key = parse_key(key)?;
    let value = key.get(&load(path)?);
    Ok(if value.is_empty() {
        "(not set)".to_string()
    } else {
        value
    })
}

fn set(path: &Path, key: &str, value: &str) -> Result<String, CliError> {
    let key = parse_key(key)?;
    let mut config = load(path)?;
    key.set(&mut config, value)?;
    config.save_to(path)?;
    Ok(format!("Set {} = {}", key.name(), key.get(&config)))
}

fn reset(path: &Path, key: &str) -> Result<String, CliError> {
    let key = parse_key(key)?;
    let mut config = load(path)?;
    key.set(&mut config, &key.default_value())?;
    config.save_to(path)?;
    Ok(format!("Reset {} to {}", key.name(), display(&key.get(&config))))
}

/// Settings grouped by section; changed values show their default.
fn list(config: &ConfigFile) -> String {
    let mut out = String::new();
    let mut section = "";
    for key in ConfigKey::ALL {
        if key.section() != section {
            if !section.is_empty() {
                out.push('\n');
            }
            section = key.section();
            let _ = writeln!(out, "[{}]", section);
        }

        let value = key.get(config);
        let default = key.default_value();
        let _ = write!(out, "  {:<24} = {}", key.key(), display(&value));
        if value != default {
            let _ = write!(out, "  (default {})", display(&default));
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "  {:<24}   {}", "", key.description());
    }
    out
}

fn display(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_path(dir: &TempDir, contents: Option<&str>) -> std::path::PathBuf {
        let path = dir.path().join("config.ini");
        if let Some(contents) = contents {
            fs::write(&path, contents).unwrap();
        }
        path
    }

    #[test]
    fn test_unknown_key_message() {
        match parse_key("server.colour") {
            Err(CliError::Config(msg)) => assert!(msg.contains("railview config list")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_set_then_get() {
        let dir = TempDir::new().unwrap();
        let path = config_path(&dir, None);

        let message = set(&path, "server.transport", "PUSH").unwrap();
        assert_eq!(message, "Set server.transport = push");
        assert_eq!(get(&path, "server.transport").unwrap(), "push");
        assert_eq!(get(&path, "server.push_url").unwrap(), "(not set)");
    }

    #[test]
    fn test_set_refuses_to_overwrite_invalid_file() {
        let dir = TempDir::new().unwrap();
        let text = "[server]\nbase_url = http://sim:9000/api\n\n[motion]\nframe_rate = fast\n";
        let path = config_path(&dir, Some(text));

        match set(&path, "alerts.high_risk_cap", "8") {
            Err(CliError::Config(msg)) => assert!(msg.contains("motion.frame_rate")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn test_reset_restores_default() {
        let dir = TempDir::new().unwrap();
        let path = config_path(&dir, Some("[alerts]\nprobability_floor = 0.6\n"));

        let message = reset(&path, "alerts.probability_floor").unwrap();
        assert_eq!(message, "Reset alerts.probability_floor to 0.3");
        assert_eq!(get(&path, "alerts.probability_floor").unwrap(), "0.3");
    }

    #[test]
    fn test_list_marks_changed_values() {
        let mut config = ConfigFile::default();
        ConfigKey::SyncTickIntervalMs.set(&mut config, "500").unwrap();

        let listing = list(&config);
        assert!(listing.starts_with("[server]\n"));
        assert!(listing.contains("[motion]"));
        assert!(listing.contains("tick_interval_ms         = 500  (default 1500)"));
        assert!(listing.contains("request_timeout_ms       = 1500\n"));
        assert!(listing.contains("push_url                 = (not set)\n"));
        assert!(listing.contains(ConfigKey::MotionExhaustion.description()));
    }
}
