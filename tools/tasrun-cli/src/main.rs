//! tasrun CLI - inspect and play TAS scripts without a game
//!
//! # Commands
//!
//! - `tasrun validate` - Parse a script and summarize what it contains
//! - `tasrun checksum` - Print the timeline checksum up to a frame
//! - `tasrun run` - Play a script headlessly and optionally write a report
//!
//! # Usage
//!
//! ```bash
//! # Check a script and everything it reads
//! tasrun validate Celeste.tas
//!
//! # Digest of the first 1200 frames
//! tasrun checksum Celeste.tas --frame 1200
//!
//! # Play to the end, writing a JSON report
//! tasrun run Celeste.tas --report report.json
//! ```
//!
//! Without a script argument the script from the config file is used.

mod checksum;
mod run;
mod validate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use tasrun_core::PlaybackConfig;

/// tasrun CLI - inspect and play TAS scripts
#[derive(Parser)]
#[command(name = "tasrun")]
#[command(about = "Inspect and play TAS scripts without a game")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a script and summarize what it contains
    Validate(validate::ValidateArgs),

    /// Print the timeline checksum up to a frame
    Checksum(checksum::ChecksumArgs),

    /// Play a script headlessly
    Run(run::RunArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate(args) => validate::execute(args, &config),
        Commands::Checksum(args) => checksum::execute(args, &config),
        Commands::Run(args) => run::execute(args, config),
    }
}

fn load_config(path: Option<&Path>) -> Result<PlaybackConfig> {
    match path {
        Some(path) => PlaybackConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(tasrun_core::config::load()),
    }
}

/// The script to work on: the argument, or the configured default, which is
/// created empty when missing.
pub(crate) fn resolve_script(script: Option<PathBuf>, config: &PlaybackConfig) -> Result<PathBuf> {
    if let Some(script) = script {
        return Ok(script);
    }

    let script = config.script_path();
    tasrun_core::config::ensure_script_exists(&script)
        .with_context(|| format!("Failed to create script: {}", script.display()))?;
    tracing::info!("Using configured script {}", script.display());
    Ok(script)
}
