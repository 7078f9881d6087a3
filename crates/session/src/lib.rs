//! Live trace sessions
//!
//! This crate provides:
//! - `AnalysisScheduler`: single-flight, newest-wins dispatch of trace runs
//! - `ResultPublisher`: the only path from a run result to the display
//! - `Session`: start/stop lifecycle tying a change stream to the pipeline
//!
//! Flow: change → debounce → schedule (cancel stale, mint token) → run →
//! publish (only if the token is still active) → display thread → sink.

pub mod publisher;
pub mod scheduler;
pub mod session;

pub use publisher::{DisplayContext, DisplaySink, PublishGate, ResultPublisher};
pub use scheduler::AnalysisScheduler;
pub use session::{LaunchResolver, Session, SessionState};
