//! Run requests and results

use std::fmt;
use std::time::Duration;

use ulid::Ulid;

use crate::error::RunError;
use crate::{CancellationToken, Snapshot};

/// Unique run identifier (ULID for timestamp + uniqueness)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(Ulid);

impl RunId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Creation time of the run in Unix milliseconds
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// "Analyze this text, unless told to stop"
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub id: RunId,
    pub snapshot: Snapshot,
    pub token: CancellationToken,
}

impl RunRequest {
    pub fn new(snapshot: Snapshot, token: CancellationToken) -> Self {
        Self {
            id: RunId::new(),
            snapshot,
            token,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Process ran to completion (exit code is not interpreted)
    Completed,
    /// Process could not be started, or its I/O broke
    Failed,
    /// Token was cancelled before the process finished
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one trace process run
///
/// Consumed exactly once by the result publisher.
#[derive(Debug)]
pub struct RunResult {
    pub id: RunId,
    pub status: RunStatus,
    pub stdout: String,
    pub stderr: String,
    /// Exit code, when the process exited normally
    pub exit_code: Option<i32>,
    /// Failure details, set only for `Failed`
    pub error: Option<RunError>,
    pub elapsed: Duration,
}

impl RunResult {
    pub fn completed(
        id: RunId,
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
        elapsed: Duration,
    ) -> Self {
        Self {
            id,
            status: RunStatus::Completed,
            stdout,
            stderr,
            exit_code,
            error: None,
            elapsed,
        }
    }

    /// A failed run carries no output; partial output is discarded.
    pub fn failed(id: RunId, error: RunError, elapsed: Duration) -> Self {
        Self {
            id,
            status: RunStatus::Failed,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            error: Some(error),
            elapsed,
        }
    }

    pub fn cancelled(id: RunId, elapsed: Duration) -> Self {
        Self {
            id,
            status: RunStatus::Cancelled,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            error: None,
            elapsed,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}
