//! Live session: re-trace a source file every time it changes

use anyhow::{Context, Result};
use cli_lib::launch::TracerLaunch;
use cli_lib::locks::SessionLock;
use cli_lib::sink::{FileSink, TerminalSink};
use cli_lib::{system_config, util};
use livetrace_core::LiveConfig;
use owo_colors::OwoColorize;
use session::{DisplaySink, LaunchResolver, Session};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use watcher::{EventKind, FileWatcher};

/// Quiet period after a change event before the file is read
const SETTLE: Duration = Duration::from_millis(25);

pub async fn run(
    config: &LiveConfig,
    file: &Path,
    driver: Option<&Path>,
    driver_args: &[String],
    output: Option<&Path>,
) -> Result<()> {
    let source = util::canonical_source(file)?;
    let lock = SessionLock::acquire(&system_config::lock_dir()?, &source)?;

    let resolver = TracerLaunch {
        config: config.tracer.clone(),
        main_file: source.clone(),
        driver: driver.map(Path::to_path_buf),
        driver_args: driver_args.to_vec(),
        working_dir: std::env::current_dir().context("Failed to get current directory")?,
    };
    // Surface launch problems here; the session itself only logs them
    resolver.resolve()?;

    let sink: Box<dyn DisplaySink> = match output {
        Some(path) => {
            println!(
                "Tracing {} into {} {}",
                source.display().to_string().cyan(),
                path.display(),
                "(Ctrl-C to stop)".dimmed()
            );
            Box::new(FileSink::new(path))
        }
        None => Box::new(TerminalSink::stdout(format!(
            "lt watch {} (Ctrl-C to stop)",
            source.display()
        ))),
    };

    let session = Session::new(config.session.clone(), sink, tokio::runtime::Handle::current())
        .context("Failed to start display thread")?;
    let mut watcher = FileWatcher::new(&source)?;

    let mut last_text = util::read_source(&source)?;
    if !session.start(&resolver, last_text.clone()) {
        anyhow::bail!("Failed to start live session for {}", source.display());
    }
    info!("Live session started for {}", source.display());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("Interrupted");
                break;
            }
            event = watcher.recv() => {
                let Some(event) = event else {
                    debug!("File watcher closed");
                    break;
                };
                // Editors that save by rename briefly delete the file
                if event.kind == EventKind::Delete {
                    continue;
                }
                // A plain write truncates first; don't read the empty middle state
                settle(&mut watcher).await;
                match std::fs::read_to_string(&source) {
                    Ok(text) if text != last_text => {
                        last_text = text.clone();
                        session.on_content_changed(text);
                    }
                    Ok(_) => debug!("Content unchanged, skipping"),
                    Err(e) => debug!("Could not read {}: {}", source.display(), e),
                }
            }
        }
    }

    session.stop();
    drop(session);
    lock.release()?;
    info!("Live session stopped for {}", source.display());

    if output.is_some() {
        println!("{}", "Stopped".dimmed());
    }
    Ok(())
}

/// Swallow the burst of events one save produces
async fn settle(watcher: &mut FileWatcher) {
    while let Ok(Some(_)) = tokio::time::timeout(SETTLE, watcher.recv()).await {}
}
