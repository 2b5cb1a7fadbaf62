//! `albumstack` command line entry point.
//!
//! # Responsibility
//! - Synthesize and validate the album stack manifest.
//! - Drive the local gateway emulator for manual checks.

mod commands;

use anyhow::{anyhow, Result};
use clap::Parser;
use commands::Commands;

#[derive(Parser, Debug)]
#[command(
    name = "albumstack",
    version,
    about = "Album table + gateway stack: synthesize, validate and invoke locally."
)]
struct Cli {
    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = "ALBUMSTACK_LOG_LEVEL")]
    log_level: Option<String>,
    /// Absolute directory for rolling log files; logs go to stderr when unset.
    #[arg(long, global = true, env = "ALBUMSTACK_LOG_DIR")]
    log_dir: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(albumstack_core::default_log_level());
    let logging = match cli.log_dir.as_deref() {
        Some(dir) => albumstack_core::init_logging(level, dir),
        None => albumstack_core::init_stderr_logging(level),
    };
    logging.map_err(|err| anyhow!(err))?;

    let outcome = match &cli.command {
        Commands::Ping => commands::ping(),
        Commands::Synth(args) => commands::synth(args),
        Commands::Validate(args) => commands::validate(args),
        Commands::Invoke(args) => commands::invoke(args),
    };
    // Buffered file writers only reach disk on flush.
    albumstack_core::flush_logging();
    outcome
}
