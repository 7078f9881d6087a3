//! Live session lifecycle
//!
//! A session is Idle until `start`, Active until `stop`. Each start builds a
//! fresh pipeline (debouncer + scheduler); the display thread outlives it so
//! the last trace stays visible across restarts.

use std::io;
use std::sync::Arc;

use livetrace_core::{LaunchError, LaunchSpec, SessionConfig, Snapshot};
use parking_lot::Mutex;
use runner::{ProcessRunner, TraceRunner};
use tokio::runtime::Handle;
use tracing::{debug, info, trace, warn};
use watcher::Debouncer;

use crate::publisher::{DisplayContext, DisplaySink};
use crate::scheduler::AnalysisScheduler;

/// Supplies the launch descriptor for the trace process
pub trait LaunchResolver {
    fn resolve(&self) -> Result<LaunchSpec, LaunchError>;
}

/// What the pipeline is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing queued or running
    Idle,
    /// A debounce countdown is running
    Pending,
    /// A trace process is executing
    Running,
}

struct Pipeline {
    scheduler: Arc<AnalysisScheduler>,
    debouncer: Debouncer<Snapshot>,
}

impl Pipeline {
    fn stop(self) {
        self.debouncer.cancel_pending();
        self.scheduler.shutdown();
    }
}

/// Ties one source file's change stream to the trace pipeline
pub struct Session {
    config: SessionConfig,
    handle: Handle,
    display: DisplayContext,
    pipeline: Mutex<Option<Pipeline>>,
}

impl Session {
    /// Create an idle session; `sink` moves onto the display thread
    pub fn new<S: DisplaySink>(config: SessionConfig, sink: S, handle: Handle) -> io::Result<Self> {
        Ok(Self {
            config,
            handle,
            display: DisplayContext::spawn(sink)?,
            pipeline: Mutex::new(None),
        })
    }

    /// Resolve the launch descriptor and start tracing `current_text`
    ///
    /// Returns false, leaving the session idle, if no valid launch descriptor
    /// can be obtained.
    pub fn start(&self, resolver: &dyn LaunchResolver, current_text: impl Into<String>) -> bool {
        let launch = match resolver.resolve() {
            Ok(launch) => launch,
            Err(e) => {
                warn!("Cannot start live session: {}", e);
                return false;
            }
        };

        let runner = ProcessRunner::new(launch).with_kill_grace(self.config.kill_grace());
        self.start_with_runner(Arc::new(runner), current_text)
    }

    /// Start with an explicit runner. Replaces any running pipeline.
    pub fn start_with_runner(&self, runner: Arc<dyn TraceRunner>, current_text: impl Into<String>) -> bool {
        let mut pipeline = self.pipeline.lock();
        if let Some(previous) = pipeline.take() {
            debug!("Restarting live session");
            previous.stop();
        }

        let scheduler = Arc::new(AnalysisScheduler::new(
            runner,
            self.display.publisher(),
            self.display.gate(),
            self.handle.clone(),
        ));

        let target = Arc::clone(&scheduler);
        let debouncer = Debouncer::new(self.config.debounce(), self.handle.clone(), move |snapshot| {
            if let Err(e) = target.schedule(snapshot) {
                debug!("Debounced run dropped: {}", e);
            }
        });

        if let Err(e) = scheduler.schedule(Snapshot::new(current_text.into())) {
            debug!("Initial run dropped: {}", e);
        }

        *pipeline = Some(Pipeline { scheduler, debouncer });
        info!(debounce_ms = self.config.debounce_ms, "Live session started");
        true
    }

    /// Cancel everything in flight and ignore changes until the next start
    pub fn stop(&self) {
        if let Some(pipeline) = self.pipeline.lock().take() {
            pipeline.stop();
            info!("Live session stopped");
        }
    }

    /// Feed the latest buffer content
    ///
    /// The caller must have persisted any other buffers the tracer reads from
    /// disk before calling this.
    pub fn on_content_changed(&self, text: impl Into<String>) {
        match self.pipeline.lock().as_ref() {
            Some(pipeline) => pipeline.debouncer.notify(Snapshot::new(text.into())),
            None => trace!("Change ignored: session not active"),
        }
    }

    pub fn is_active(&self) -> bool {
        self.pipeline.lock().is_some()
    }

    /// A pending edit takes precedence over a run that it is about to replace
    pub fn state(&self) -> SessionState {
        match self.pipeline.lock().as_ref() {
            None => SessionState::Idle,
            Some(pipeline) if pipeline.debouncer.has_pending() => SessionState::Pending,
            Some(pipeline) if pipeline.scheduler.is_running() => SessionState::Running,
            Some(_) => SessionState::Idle,
        }
    }

    /// Block until queued display updates have been applied
    pub fn flush_display(&self) {
        self.display.flush();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}
