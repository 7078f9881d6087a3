//! Configuration management command
//!
//! View and edit the user configuration file.

use anyhow::{Context, Result};
use cli_lib::system_config;
use livetrace_core::LiveConfig;
use owo_colors::OwoColorize;
use std::path::PathBuf;

const KEYS: &[&str] = &[
    "session.debounce_ms",
    "session.kill_grace_ms",
    "tracer.interpreter",
    "tracer.module",
    "tracer.search_path",
    "log.level",
    "log.file",
];

/// List all configuration values
pub async fn run_list() -> Result<()> {
    let config = system_config::load()?;
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    println!("{}", "Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    let mut section = "";
    for key in KEYS {
        let (prefix, name) = key.split_once('.').unwrap_or(("", key));
        if prefix != section {
            if !section.is_empty() {
                println!();
            }
            println!("{}", format!("[{}]", prefix).yellow());
            section = prefix;
        }
        println!("  {} = {}", name.cyan(), get_value(&config, key)?);
    }

    println!("\n{}", "Valid Ranges:".bold());
    println!("  debounce_ms: 10-10000");
    println!("  kill_grace_ms: 10-30000");
    println!("  level: trace, debug, info, warn, error");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(key: &str) -> Result<()> {
    let config = system_config::load()?;
    println!("{}", get_value(&config, key)?);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load()?;

    set_value(&mut config, key, value)?;

    // Validate before saving
    config.validate()
        .context("Invalid configuration value")?;

    system_config::save(&config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    println!(
        "{}",
        "Note: Running sessions pick up changes on restart".yellow()
    );

    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    if create && !config_path.exists() {
        system_config::init_if_missing()?;
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", system_config::example_config());
    Ok(())
}

fn get_value(config: &LiveConfig, key: &str) -> Result<String> {
    let value = match key {
        "session.debounce_ms" => config.session.debounce_ms.to_string(),
        "session.kill_grace_ms" => config.session.kill_grace_ms.to_string(),
        "tracer.interpreter" => config.tracer.interpreter.clone(),
        "tracer.module" => config.tracer.module.clone(),
        "tracer.search_path" => std::env::join_paths(&config.tracer.search_path)
            .map(|joined| joined.to_string_lossy().into_owned())
            .unwrap_or_default(),
        "log.level" => config.log.level.clone(),
        "log.file" => config
            .log
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        _ => unknown_key(key)?,
    };
    Ok(value)
}

fn set_value(config: &mut LiveConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "session.debounce_ms" => {
            config.session.debounce_ms = value.parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "session.kill_grace_ms" => {
            config.session.kill_grace_ms = value.parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "tracer.interpreter" => config.tracer.interpreter = value.to_string(),
        "tracer.module" => config.tracer.module = value.to_string(),
        "tracer.search_path" => {
            config.tracer.search_path = if value.is_empty() {
                Vec::new()
            } else {
                std::env::split_paths(value).collect()
            };
        }
        "log.level" => config.log.level = value.to_lowercase(),
        "log.file" => {
            config.log.file = if value.is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }
        _ => unknown_key(key)?,
    }
    Ok(())
}

fn unknown_key<T>(key: &str) -> Result<T> {
    anyhow::bail!(
        "Unknown config key: {}. Use 'lt config list' to see available keys.",
        key
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_round_trips() {
        let mut config = LiveConfig::default();
        for key in KEYS {
            let value = get_value(&config, key).unwrap();
            set_value(&mut config, key, &value).unwrap();
        }
        assert_eq!(config, LiveConfig::default());
    }

    #[test]
    fn test_set_parses_values() {
        let mut config = LiveConfig::default();
        set_value(&mut config, "session.debounce_ms", "150").unwrap();
        set_value(&mut config, "log.level", "DEBUG").unwrap();
        set_value(&mut config, "log.file", "/tmp/lt.log").unwrap();

        assert_eq!(config.session.debounce_ms, 150);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.file, Some(PathBuf::from("/tmp/lt.log")));

        assert!(set_value(&mut config, "session.debounce_ms", "soon").is_err());
        assert!(set_value(&mut config, "nope.key", "1").is_err());
    }
}
