//! Livetrace configuration
//!
//! Stored as TOML. Every field has a default, so a missing file or a partial
//! file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub session: SessionConfig,
    pub tracer: TracerConfig,
    pub log: LogConfig,
}

/// Live session timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Quiet period before an edit triggers a run (default: 300ms)
    pub debounce_ms: u64,
    /// How long a cancelled process may take to exit before it is killed (default: 500ms)
    pub kill_grace_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            kill_grace_ms: 500,
        }
    }
}

impl SessionConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }
}

/// Trace process selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Interpreter executable (name on PATH or a path)
    pub interpreter: String,
    /// Tracer module run with `-m`
    pub module: String,
    /// Extra directories placed first on the module search path
    pub search_path: Vec<PathBuf>,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            module: "code_tracer".to_string(),
            search_path: Vec::new(),
        }
    }
}

/// Logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of trace, debug, info, warn, error
    pub level: String,
    /// Log file used while the terminal is the display
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl LiveConfig {
    /// Load from a TOML file, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate and write to a TOML file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(10..=10_000).contains(&self.session.debounce_ms) {
            anyhow::bail!(
                "session.debounce_ms must be between 10 and 10000 (got {})",
                self.session.debounce_ms
            );
        }
        if !(10..=30_000).contains(&self.session.kill_grace_ms) {
            anyhow::bail!(
                "session.kill_grace_ms must be between 10 and 30000 (got {})",
                self.session.kill_grace_ms
            );
        }
        if self.tracer.interpreter.trim().is_empty() {
            anyhow::bail!("tracer.interpreter must not be empty");
        }
        if self.tracer.module.trim().is_empty() {
            anyhow::bail!("tracer.module must not be empty");
        }
        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            anyhow::bail!(
                "log.level must be one of {} (got '{}')",
                LOG_LEVELS.join(", "),
                self.log.level
            );
        }
        Ok(())
    }

    /// Annotated example file
    pub fn example() -> &'static str {
        r#"# livetrace configuration

[session]
# Quiet period after the last edit before the tracer runs (10-10000)
debounce_ms = 300
# Grace period for a cancelled tracer to exit before it is killed (10-30000)
kill_grace_ms = 500

[tracer]
interpreter = "python3"
module = "code_tracer"
# Directories prepended to PYTHONPATH
search_path = []

[log]
# trace, debug, info, warn or error
level = "info"
# file = "/tmp/livetrace.log"
"#
    }
}
