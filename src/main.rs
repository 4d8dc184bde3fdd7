//! GenStega - hide secrets in generated images
//!
//! CLI front end: one-shot encode/decode plus an interactive bot session.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ChatCommand, CommandExecutor, DecodeCommand, EncodeCommand};
use genstega::AppConfig;

/// GenStega - hide secrets in generated images
///
/// Secrets are sealed with a password and an expiry, then hidden in the
/// least significant bits of a PNG. Share the PNG as a file, never as a
/// compressed photo.
#[derive(Parser)]
#[command(name = "genstega")]
#[command(version)]
#[command(about = "Hide password-protected, expiring secrets in PNG images")]
struct Cli {
    /// Path to a TOML config file (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hide a secret in a PNG image
    Encode(EncodeCommand),

    /// Recover a secret from a PNG image
    Decode(DecodeCommand),

    /// Talk to the bot from the terminal
    Chat(ChatCommand),
}

impl Commands {
    fn executor(&self) -> &dyn CommandExecutor {
        match self {
            Commands::Encode(cmd) => cmd,
            Commands::Decode(cmd) => cmd,
            Commands::Chat(cmd) => cmd,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("genstega=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    cli.command.executor().execute(&config)
}
