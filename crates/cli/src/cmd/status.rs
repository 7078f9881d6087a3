//! Show whether a live session is watching a file

use anyhow::Result;
use cli_lib::locks::SessionLock;
use cli_lib::{system_config, util};
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(file: &Path) -> Result<()> {
    let source = util::canonical_source(file)?;
    let lock_dir = system_config::lock_dir()?;

    println!("Source:        {}", source.display().to_string().cyan());

    print!("Live session:  ");
    match SessionLock::inspect(&lock_dir, &source)? {
        Some(holder) => {
            println!("{}", "Running ✓".green());
            println!("  PID:         {}", holder.pid);
            println!(
                "  Started:     {}",
                util::format_relative_time(holder.started_at)
            );
        }
        None => {
            println!("{}", "Not running".yellow());
            println!("  {}", format!("Tip: Start with 'lt watch {}'", file.display()).dimmed());
        }
    }

    Ok(())
}
