//! Error types shared across the pipeline

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a trace process run failed
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to spawn trace process: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed to write source to trace process: {0}")]
    Input(#[source] io::Error),

    #[error("failed to read trace process output: {0}")]
    Output(#[source] io::Error),

    #[error("failed to wait for trace process: {0}")]
    Wait(#[source] io::Error),
}

/// Scheduling was refused
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("scheduler has been shut down")]
    ShutDown,
}

/// No valid launch descriptor could be built
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("source file not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("interpreter not found: {0}")]
    InterpreterNotFound(String),

    #[error("invalid driver script {}: {reason}", .path.display())]
    InvalidDriver { path: PathBuf, reason: String },

    #[error("working directory is not a directory: {}", .0.display())]
    InvalidWorkingDir(PathBuf),

    #[error("invalid module search path: {0}")]
    InvalidSearchPath(String),
}
