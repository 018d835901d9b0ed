//! Handler for the `check` command.

use std::path::Path;

use crate::config::ManagerConfig;
use crate::error::Result;

/// Load and validate the config, printing the sanitized view as JSON.
pub fn execute<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = ManagerConfig::load(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config.sanitized())?);
    Ok(())
}
