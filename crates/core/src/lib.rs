//! Core types for livetrace
//!
//! This crate provides:
//! - Immutable source snapshots
//! - Generation-scoped cancellation tokens
//! - Run requests, results and statuses
//! - The opaque process launch descriptor
//! - Configuration (`LiveConfig`)

pub mod config;
pub mod error;
pub mod launch;
pub mod run;
pub mod snapshot;
pub mod token;

// Re-exports
pub use config::{LiveConfig, LogConfig, SessionConfig, TracerConfig};
pub use error::{LaunchError, RunError, ScheduleError};
pub use launch::LaunchSpec;
pub use run::{RunId, RunRequest, RunResult, RunStatus};
pub use snapshot::Snapshot;
pub use token::{CancellationToken, GenerationClock};
