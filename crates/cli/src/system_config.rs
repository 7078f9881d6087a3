//! Configuration and state file locations
//!
//! `$LIVETRACE_CONFIG` overrides the config file path and
//! `$LIVETRACE_STATE_DIR` the state directory (locks, default log file).

use std::path::PathBuf;

use anyhow::{Context, Result};
use livetrace_core::LiveConfig;

const CONFIG_ENV: &str = "LIVETRACE_CONFIG";
const STATE_ENV: &str = "LIVETRACE_STATE_DIR";

/// Path of the config file
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("livetrace").join("config.toml"))
}

/// Load the config file, or defaults if there is none
pub fn load() -> Result<LiveConfig> {
    match config_file_path() {
        Some(path) => LiveConfig::load_from(&path),
        None => Ok(LiveConfig::default()),
    }
}

pub fn save(config: &LiveConfig) -> Result<()> {
    let path = config_file_path()
        .context("Could not determine config file path")?;
    config.save_to(&path)
}

/// Write the annotated example config if no config file exists yet
pub fn init_if_missing() -> Result<()> {
    let path = config_file_path()
        .context("Could not determine config file path")?;
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;
    }
    std::fs::write(&path, example_config())
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

pub fn example_config() -> &'static str {
    LiveConfig::example()
}

/// Directory for per-user runtime state
pub fn state_dir() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(STATE_ENV) {
        return Ok(PathBuf::from(path));
    }
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .map(|dir| dir.join("livetrace"))
        .context("Could not determine state directory")
}

/// Directory holding per-file session locks
pub fn lock_dir() -> Result<PathBuf> {
    Ok(state_dir()?.join("locks"))
}

/// Log file used while the terminal is the display
pub fn default_log_file() -> Result<PathBuf> {
    Ok(state_dir()?.join("livetrace.log"))
}
