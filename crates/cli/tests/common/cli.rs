//! Driving the `lt` binary from tests
//!
//! `LtCommand` builds an invocation; `Outcome` captures what came back along
//! with how long it took.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// One invocation of the `lt` binary built for this test run
pub struct LtCommand {
    cwd: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
}

impl LtCommand {
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(OsString::from));
        self
    }

    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    fn build(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_lt"));
        command
            .current_dir(&self.cwd)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null());
        command
    }

    /// Run to completion
    pub fn execute(&self) -> Result<Outcome> {
        let started = Instant::now();
        let output = self
            .build()
            .output()
            .with_context(|| format!("Failed to run lt {:?}", self.args))?;

        Ok(Outcome {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            elapsed: started.elapsed(),
        })
    }

    /// Start a long-running invocation such as `watch`
    pub fn spawn(&self) -> Result<Child> {
        self.build()
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn lt {:?}", self.args))
    }

    pub fn assert_success(&self) -> Result<Outcome> {
        let outcome = self.execute()?;
        if !outcome.success() {
            anyhow::bail!("lt {:?} failed:\n{}", self.args, outcome);
        }
        Ok(outcome)
    }

    pub fn assert_failure(&self) -> Result<Outcome> {
        let outcome = self.execute()?;
        if outcome.success() {
            anyhow::bail!("lt {:?} unexpectedly succeeded:\n{}", self.args, outcome);
        }
        Ok(outcome)
    }
}

/// Captured result of a finished invocation
#[derive(Debug, Clone)]
pub struct Outcome {
    pub stdout: String,
    pub stderr: String,
    /// None when killed by a signal
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}

impl Outcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "exit: {:?} after {:?}", self.exit_code, self.elapsed)?;
        writeln!(f, "stdout:\n{}", self.stdout)?;
        write!(f, "stderr:\n{}", self.stderr)
    }
}

/// Poll `check` every 25ms until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
}
