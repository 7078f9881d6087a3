//! External trace process runner
//!
//! One call to [`ProcessRunner::run`] owns one child process:
//! - spawn it from the launch spec
//! - write the snapshot to stdin and close it
//! - drain stdout and stderr concurrently while waiting for exit
//! - on cancellation, SIGTERM first, SIGKILL once the grace period runs out

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use livetrace_core::{LaunchSpec, RunError, RunId, RunRequest, RunResult};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, warn};

use crate::TraceRunner;

/// Default grace period between the stop request and the kill
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_millis(500);

/// Runs the trace process described by a [`LaunchSpec`]
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    launch: LaunchSpec,
    kill_grace: Duration,
}

impl ProcessRunner {
    pub fn new(launch: LaunchSpec) -> Self {
        Self {
            launch,
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    /// Set how long a cancelled process may take to exit before it is killed
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    pub fn launch(&self) -> &LaunchSpec {
        &self.launch
    }

    fn spawn(&self) -> std::io::Result<Child> {
        let mut command = Command::from(self.launch.command());
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command.spawn()
    }
}

#[async_trait]
impl TraceRunner for ProcessRunner {
    async fn run(&self, request: RunRequest) -> RunResult {
        let started = Instant::now();
        let RunRequest { id, snapshot, token } = request;

        if token.is_cancelled() {
            return RunResult::cancelled(id, started.elapsed());
        }

        debug!(run = %id, command = %self.launch.display(), bytes = snapshot.len(), "Spawning trace process");

        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(run = %id, command = %self.launch.display(), "Failed to spawn trace process: {}", e);
                return RunResult::failed(id, RunError::Spawn(e), started.elapsed());
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            res = drive(&mut child, snapshot.text()) => Some(res),
        };

        match outcome {
            None => {
                debug!(run = %id, "Run cancelled, stopping trace process");
                terminate(&mut child, self.kill_grace, id).await;
                RunResult::cancelled(id, started.elapsed())
            }
            Some(Ok((status, stdout, stderr))) => {
                debug!(
                    run = %id,
                    status = %status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Trace process finished"
                );
                RunResult::completed(id, stdout, stderr, status.code(), started.elapsed())
            }
            Some(Err(e)) => {
                warn!(run = %id, "Trace process I/O failed: {}", e);
                if let Err(kill_err) = child.start_kill() {
                    debug!(run = %id, "Kill after I/O failure: {}", kill_err);
                }
                RunResult::failed(id, e, started.elapsed())
            }
        }
    }
}

/// Feed stdin, drain both output pipes and wait for exit, all concurrently
async fn drive(child: &mut Child, source: &str) -> Result<(ExitStatus, String, String), RunError> {
    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (_, stdout, stderr, status) = tokio::try_join!(
        write_input(stdin, source),
        read_output(stdout),
        read_output(stderr),
        async { child.wait().await.map_err(RunError::Wait) },
    )?;

    Ok((status, stdout, stderr))
}

/// Write the whole source, then drop the pipe to signal end of input
async fn write_input(stdin: Option<ChildStdin>, source: &str) -> Result<(), RunError> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    stdin
        .write_all(source.as_bytes())
        .await
        .map_err(RunError::Input)?;
    stdin.shutdown().await.map_err(RunError::Input)?;
    Ok(())
}

async fn read_output<R: AsyncRead + Unpin>(pipe: Option<R>) -> Result<String, RunError> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await.map_err(RunError::Output)?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Ask the process to stop, then kill it if it outlives the grace period
async fn terminate(child: &mut Child, grace: Duration, id: RunId) {
    if request_stop(child) {
        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(_)) => return,
            Ok(Err(e)) => debug!(run = %id, "Wait after stop request failed: {}", e),
            Err(_) => warn!(
                run = %id,
                grace_ms = grace.as_millis() as u64,
                "Trace process ignored stop request, killing"
            ),
        }
    }

    if let Err(e) = child.kill().await {
        debug!(run = %id, "Kill failed (process likely already exited): {}", e);
    }
}

#[cfg(unix)]
fn request_stop(child: &Child) -> bool {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // No pid means the child has already been reaped
    match child.id() {
        Some(pid) => kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok(),
        None => false,
    }
}

#[cfg(not(unix))]
fn request_stop(_child: &Child) -> bool {
    false
}
