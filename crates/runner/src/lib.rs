//! Trace process execution for livetrace
//!
//! This crate provides:
//! - The `TraceRunner` seam the scheduler dispatches runs through
//! - `ProcessRunner`, which feeds a snapshot to an external trace process

pub mod process;

pub use process::ProcessRunner;

use async_trait::async_trait;
use livetrace_core::{RunRequest, RunResult};

/// Executes one run request to completion, failure or cancellation
///
/// Implementations must observe `request.token` and return promptly with a
/// `Cancelled` result once it flips. They never panic on process errors;
/// failures come back as `Failed` results.
#[async_trait]
pub trait TraceRunner: Send + Sync {
    async fn run(&self, request: RunRequest) -> RunResult;
}
