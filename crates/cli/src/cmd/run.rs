//! Trace a source file once

use anyhow::{Context, Result};
use cli_lib::launch::build_launch;
use cli_lib::util;
use indicatif::{ProgressBar, ProgressStyle};
use livetrace_core::{GenerationClock, LiveConfig, RunRequest, RunStatus, Snapshot};
use owo_colors::OwoColorize;
use runner::{ProcessRunner, TraceRunner};
use std::path::Path;
use std::time::Duration;

pub async fn run(
    config: &LiveConfig,
    file: &Path,
    driver: Option<&Path>,
    driver_args: &[String],
) -> Result<()> {
    let source = util::canonical_source(file)?;
    let text = util::read_source(&source)?;
    let working_dir = std::env::current_dir()
        .context("Failed to get current directory")?;

    let launch = build_launch(&config.tracer, &source, driver, driver_args, &working_dir)?;
    tracing::debug!("Launching {}", launch.display());

    let runner = ProcessRunner::new(launch).with_kill_grace(config.session.kill_grace());
    let token = GenerationClock::new().mint();

    // Ctrl-C cancels the run and lets the runner terminate the process
    let interrupt_token = token.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt_token.cancel();
        }
    });

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Tracing {}", source.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = runner.run(RunRequest::new(Snapshot::from(text), token)).await;

    spinner.finish_and_clear();
    interrupt.abort();

    match result.status {
        RunStatus::Completed => {
            print!("{}", result.stdout);
            if !result.stderr.is_empty() {
                eprint!("{}", result.stderr.dimmed());
            }
            tracing::debug!(
                run = %result.id,
                "Trace finished in {}",
                util::format_elapsed(result.elapsed)
            );
            Ok(())
        }
        RunStatus::Failed => match result.error {
            Some(e) => Err(anyhow::Error::new(e).context("Trace run failed")),
            None => anyhow::bail!("Trace run failed"),
        },
        RunStatus::Cancelled => anyhow::bail!("Trace cancelled"),
    }
}
