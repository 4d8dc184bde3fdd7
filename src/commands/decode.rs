//! Decode command - recover a secret from a stego PNG.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use genstega::stego::is_png;
use genstega::{open_from_png, AppConfig};

use super::{resolve_password, CommandExecutor};

/// Recover a secret hidden by `encode`.
///
/// A wrong password and an image without a hidden message produce the same
/// error.
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// Stego PNG to read
    #[arg(short, long)]
    pub input: PathBuf,

    /// Password (prompted with hidden input if omitted)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Write the secret to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for DecodeCommand {
    fn execute(&self, config: &AppConfig) -> Result<()> {
        let png = std::fs::read(&self.input)
            .with_context(|| format!("Failed to read {}", self.input.display()))?;

        if !is_png(&png) {
            anyhow::bail!(
                "{} is not a PNG. Hidden messages only survive in PNG files.",
                self.input.display()
            );
        }

        let password = resolve_password(self.password.as_deref(), "Password: ")?;

        let secret = open_from_png(&png, &password, &config.kdf.params())
            .map_err(|e| anyhow::anyhow!("{}", e.reply()))?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, secret.as_bytes())
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Secret written to {}", path.display());
            }
            None => println!("{}", secret),
        }

        Ok(())
    }
}
