//! Single-flight analysis scheduling
//!
//! Every `schedule` cancels the previous run's token before minting a new one,
//! so at most one token is ever active. The cancelled worker may still be
//! tearing its process down; its result is stopped at the publisher.
//!
//! `schedule` flips the old token without the [`PublishGate`], so it never
//! waits on a display write in progress. A write of the old result that
//! already started lands before the newer one, which queues behind it.
//! Only `shutdown` cancels under the gate.

use std::sync::Arc;

use livetrace_core::{CancellationToken, GenerationClock, RunId, RunRequest, ScheduleError, Snapshot};
use parking_lot::Mutex;
use runner::TraceRunner;
use tokio::runtime::Handle;
use tracing::debug;

use crate::publisher::{PublishGate, ResultPublisher};

#[derive(Default)]
struct SchedulerState {
    /// Token of the newest run; the only one that may be active
    current: Option<CancellationToken>,
    /// Generation of the newest run while its worker is still going
    running: Option<u64>,
    shut_down: bool,
}

/// Newest-wins dispatcher of trace runs onto a worker pool
pub struct AnalysisScheduler {
    runner: Arc<dyn TraceRunner>,
    publisher: ResultPublisher,
    gate: PublishGate,
    handle: Handle,
    clock: GenerationClock,
    state: Arc<Mutex<SchedulerState>>,
}

impl AnalysisScheduler {
    pub fn new(
        runner: Arc<dyn TraceRunner>,
        publisher: ResultPublisher,
        gate: PublishGate,
        handle: Handle,
    ) -> Self {
        Self {
            runner,
            publisher,
            gate,
            handle,
            clock: GenerationClock::new(),
            state: Arc::new(Mutex::new(SchedulerState::default())),
        }
    }

    /// Cancel the current run (if any) and start a run for `snapshot`
    ///
    /// Never blocks on the run itself.
    pub fn schedule(&self, snapshot: Snapshot) -> Result<RunId, ScheduleError> {
        let request = {
            let mut state = self.state.lock();
            if state.shut_down {
                debug!("Schedule rejected: scheduler shut down");
                return Err(ScheduleError::ShutDown);
            }

            if let Some(previous) = state.current.take() {
                previous.cancel();
                debug!(generation = previous.generation(), "Cancelled previous run");
            }

            let token = self.clock.mint();
            state.current = Some(token.clone());
            state.running = Some(token.generation());
            RunRequest::new(snapshot, token)
        };

        let id = request.id;
        let generation = request.token.generation();
        debug!(run = %id, generation, bytes = request.snapshot.len(), "Scheduling trace run");

        let runner = Arc::clone(&self.runner);
        let publisher = self.publisher.clone();
        let state = Arc::clone(&self.state);

        self.handle.spawn(async move {
            let token = request.token.clone();
            let result = runner.run(request).await;
            debug!(run = %result.id, status = %result.status, "Trace run finished");
            publisher.publish(result, &token);

            let mut state = state.lock();
            if state.running == Some(generation) {
                state.running = None;
            }
        });

        Ok(id)
    }

    /// Cancel the current run and refuse any further scheduling
    ///
    /// Waits out a display write in progress; nothing reaches the sink after
    /// this returns.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        if state.shut_down {
            return;
        }
        state.shut_down = true;
        if let Some(current) = state.current.take() {
            self.gate.cancel(&current);
            debug!(generation = current.generation(), "Cancelled run on shutdown");
        }
    }

    /// True while the newest run's worker has not finished
    pub fn is_running(&self) -> bool {
        self.state.lock().running.is_some()
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.lock().shut_down
    }

    /// Token of the newest run, if it is still active
    pub fn active_token(&self) -> Option<CancellationToken> {
        self.state
            .lock()
            .current
            .as_ref()
            .filter(|token| token.is_active())
            .cloned()
    }
}
