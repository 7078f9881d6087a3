//! Change sources for livetrace
//!
//! This crate provides:
//! - A debouncer that coalesces bursts of change notifications
//! - A file watcher that reports changes to a single source file

pub mod debounce;
pub mod watch;

pub use debounce::Debouncer;
pub use watch::FileWatcher;

use std::path::PathBuf;

/// File system event for the watched file
#[derive(Debug, Clone)]
pub struct WatchEvent {
    /// Path that changed
    pub path: PathBuf,
    /// Type of change
    pub kind: EventKind,
}

/// Type of file system event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// File created
    Create,
    /// File modified
    Modify,
    /// File deleted
    Delete,
    /// File renamed (editors often save by renaming a temp file over the original)
    Rename,
}
