//! Result publishing and the serialized display path
//!
//! The display sink lives on its own thread and is only touched there. Results
//! reach it through a channel; right before each `set_text` the display thread
//! re-checks the run's token under the [`PublishGate`]. Shutdown cancels under
//! the same gate, so once it returns the cancelled run can no longer reach the
//! sink.

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};
use livetrace_core::{CancellationToken, RunId, RunResult, RunStatus};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

/// Destination surface for trace output
pub trait DisplaySink: Send + 'static {
    /// Replace everything currently displayed with `text`
    fn set_text(&mut self, text: &str);
}

impl DisplaySink for Box<dyn DisplaySink> {
    fn set_text(&mut self, text: &str) {
        (**self).set_text(text);
    }
}

/// Serializes token cancellation against the final publish check
#[derive(Debug, Clone, Default)]
pub struct PublishGate {
    lock: Arc<Mutex<()>>,
}

impl PublishGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel `token`; no publish for it can start after this returns
    pub fn cancel(&self, token: &CancellationToken) {
        let _guard = self.lock.lock();
        token.cancel();
    }

    /// Run `apply` only if `token` is still active. Returns whether it ran.
    pub fn apply_if_active(&self, token: &CancellationToken, apply: impl FnOnce()) -> bool {
        let _guard = self.lock.lock();
        if token.is_cancelled() {
            return false;
        }
        apply();
        true
    }
}

enum DisplayCommand {
    Publish {
        run: RunId,
        token: CancellationToken,
        text: String,
    },
    Flush(Sender<()>),
    Shutdown,
}

/// The single serialized execution context that owns the display sink
pub struct DisplayContext {
    tx: Sender<DisplayCommand>,
    gate: PublishGate,
    thread: Option<JoinHandle<()>>,
}

impl DisplayContext {
    /// Move `sink` onto a dedicated display thread
    pub fn spawn<S: DisplaySink>(sink: S) -> io::Result<Self> {
        let gate = PublishGate::new();
        let (tx, rx) = unbounded();
        let thread_gate = gate.clone();

        let thread = std::thread::Builder::new()
            .name("livetrace-display".to_string())
            .spawn(move || display_loop(sink, rx, thread_gate))?;

        Ok(Self {
            tx,
            gate,
            thread: Some(thread),
        })
    }

    /// Gate shared with whoever cancels tokens
    pub fn gate(&self) -> PublishGate {
        self.gate.clone()
    }

    /// A publisher feeding this display
    pub fn publisher(&self) -> ResultPublisher {
        ResultPublisher {
            tx: self.tx.clone(),
        }
    }

    /// Block until every publication sent before this call has been handled
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        if self.tx.send(DisplayCommand::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    /// Stop the display thread after it drains queued commands
    pub fn shutdown(&mut self) {
        let _ = self.tx.send(DisplayCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Display thread panicked");
            }
        }
    }
}

impl Drop for DisplayContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn display_loop<S: DisplaySink>(mut sink: S, rx: Receiver<DisplayCommand>, gate: PublishGate) {
    for command in rx {
        match command {
            DisplayCommand::Publish { run, token, text } => {
                let applied = gate.apply_if_active(&token, || sink.set_text(&text));
                if applied {
                    debug!(run = %run, bytes = text.len(), "Display updated");
                } else {
                    trace!(run = %run, "Dropped result cancelled while queued");
                }
            }
            DisplayCommand::Flush(ack) => {
                let _ = ack.send(());
            }
            DisplayCommand::Shutdown => break,
        }
    }
}

/// Decides whether a run result reaches the display
#[derive(Clone)]
pub struct ResultPublisher {
    tx: Sender<DisplayCommand>,
}

impl ResultPublisher {
    /// Hand a completed, still-wanted result to the display thread
    ///
    /// Returns true if the result was queued for display. Cancelled runs are
    /// dropped without logging; failures are logged and dropped.
    pub fn publish(&self, result: RunResult, token: &CancellationToken) -> bool {
        match result.status {
            RunStatus::Cancelled => return false,
            RunStatus::Failed => {
                match &result.error {
                    Some(e) => warn!(run = %result.id, "Trace run failed: {}", e),
                    None => warn!(run = %result.id, "Trace run failed"),
                }
                return false;
            }
            RunStatus::Completed => {}
        }

        if token.is_cancelled() {
            trace!(run = %result.id, "Discarding stale result");
            return false;
        }

        if !result.stderr.is_empty() {
            warn!(run = %result.id, "Trace process wrote to stderr:\n{}", result.stderr.trim_end());
        }

        let command = DisplayCommand::Publish {
            run: result.id,
            token: token.clone(),
            text: result.stdout,
        };
        if self.tx.send(command).is_err() {
            debug!(run = %result.id, "Display closed, result dropped");
            return false;
        }
        true
    }
}
