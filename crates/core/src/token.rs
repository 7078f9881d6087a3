//! Generation-scoped cancellation tokens
//!
//! Each run attempt gets a token from a [`GenerationClock`]. A token moves from
//! active to cancelled exactly once and is never handed to another run. Clones
//! share one flag, so the process runner and the result publisher always agree
//! on whether a run is still wanted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken as Flag;

/// Monotonic generation clock for run attempts
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
    next: Arc<AtomicU64>,
}

impl GenerationClock {
    /// Create a new clock starting at generation 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next generation ID
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// Mint a fresh, active token for the next generation
    pub fn mint(&self) -> CancellationToken {
        CancellationToken::new(self.next())
    }
}

/// One-shot cancellation flag bound to a single run attempt
#[derive(Debug, Clone)]
pub struct CancellationToken {
    generation: u64,
    flag: Flag,
}

impl CancellationToken {
    /// Create an active token for the given generation
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            flag: Flag::new(),
        }
    }

    /// Generation this token was minted for
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// True once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.is_cancelled()
    }

    /// True while the run is still wanted
    pub fn is_active(&self) -> bool {
        !self.is_cancelled()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.cancel();
    }

    /// Resolves once cancellation has been requested
    pub async fn cancelled(&self) {
        self.flag.cancelled().await;
    }
}
