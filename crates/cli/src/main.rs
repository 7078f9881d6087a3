//! livetrace CLI - lt command

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli_lib::{logging, system_config};
use std::path::PathBuf;

mod cmd;

/// livetrace - Trace your code as you type
#[derive(Parser)]
#[command(name = "lt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace a source file once and print the result
    Run {
        /// Source file to trace
        file: PathBuf,
        /// Driver script that imports the traced file
        #[arg(long)]
        driver: Option<PathBuf>,
        /// Arguments passed to the driver script
        #[arg(last = true)]
        driver_args: Vec<String>,
    },
    /// Re-trace a source file every time it changes
    Watch {
        /// Source file to trace
        file: PathBuf,
        /// Driver script that imports the traced file
        #[arg(long)]
        driver: Option<PathBuf>,
        /// Write each trace to this file instead of the terminal
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Quiet period before a change is traced (overrides config)
        #[arg(long)]
        debounce_ms: Option<u64>,
        /// Arguments passed to the driver script
        #[arg(last = true)]
        driver_args: Vec<String>,
    },
    /// Show whether a live session is watching a file
    Status {
        /// Source file
        file: PathBuf,
    },
    /// View and edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Get a single configuration value
    Get {
        /// Key, e.g. session.debounce_ms
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Key, e.g. session.debounce_ms
        key: String,
        /// New value
        value: String,
    },
    /// Show the config file path
    Path {
        /// Create the file with example content if missing
        #[arg(long)]
        create: bool,
    },
    /// Print an annotated example config
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config file must not lock the user out of `lt config`
    let loaded = system_config::load();
    let log_config = loaded
        .as_ref()
        .map(|config| config.log.clone())
        .unwrap_or_default();

    // The terminal display owns stdout while watching, so logs go to a file
    let _log_guard = match &cli.command {
        Commands::Watch { output: None, .. } => {
            let log_file = match &log_config.file {
                Some(path) => path.clone(),
                None => system_config::default_log_file()?,
            };
            Some(logging::init_file(&log_config.level, &log_file)?)
        }
        _ => {
            logging::init_stderr(&log_config.level)?;
            None
        }
    };

    match cli.command {
        Commands::Run { file, driver, driver_args } => {
            let config = loaded?;
            cmd::run::run(&config, &file, driver.as_deref(), &driver_args).await
        }
        Commands::Watch { file, driver, output, debounce_ms, driver_args } => {
            let mut config = loaded?;
            if let Some(ms) = debounce_ms {
                config.session.debounce_ms = ms;
                config.validate()?;
            }
            cmd::watch::run(&config, &file, driver.as_deref(), &driver_args, output.as_deref()).await
        }
        Commands::Status { file } => cmd::status::run(&file).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list().await,
            ConfigCommands::Get { key } => cmd::config::run_get(&key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(&key, &value).await,
            ConfigCommands::Path { create } => cmd::config::run_path(create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
