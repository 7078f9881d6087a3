//! Common utilities for integration tests

pub mod cli;

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated config and state directories plus a scratch project
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("config").join("config.toml")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root().join("state")
    }

    /// Write a file under the scratch root and return its path
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root().join(name);
        std::fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Install an executable shell script standing in for the interpreter
    #[cfg(unix)]
    pub fn fake_interpreter(&self, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.write_file("fake-python", &format!("#!/bin/sh\n{}\n", body));
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    /// Command preconfigured to use this environment's config and state
    pub fn lt(&self, args: &[&str]) -> cli::LtCommand {
        let config = self.config_path().to_string_lossy().into_owned();
        let state = self.state_dir().to_string_lossy().into_owned();
        let mut cmd = cli::LtCommand::new(self.root());
        cmd.env("LIVETRACE_CONFIG", config.as_str())
            .env("LIVETRACE_STATE_DIR", state.as_str())
            .args(args);
        cmd
    }
}
