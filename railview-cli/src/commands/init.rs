//! Init command - write a configuration file with every default spelled out.

use railview::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command. Existing values are kept.
pub fn run() -> Result<(), CliError> {
    let path = config_file_path();
    let existed = path.exists();

    let config = ConfigFile::load()?;
    config.save()?;

    if existed {
        println!("Updated configuration file: {}", path.display());
    } else {
        println!("Created configuration file: {}", path.display());
    }
    println!();
    println!("Server: {}", config.server.base_url);
    println!("Transport: {}", config.server.transport);
    println!();
    println!("Edit this file to customize railview settings.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
