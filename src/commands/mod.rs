//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor` trait.

mod chat;
mod decode;
mod encode;

pub use chat::ChatCommand;
pub use decode::DecodeCommand;
pub use encode::EncodeCommand;

use anyhow::{Context, Result};
use zeroize::Zeroizing;

use genstega::AppConfig;

/// Trait for command execution - Strategy pattern.
///
/// Each command struct holds its parsed arguments and implements
/// this trait to define its execution logic.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments.
    fn execute(&self, config: &AppConfig) -> Result<()>;
}

/// Use the password given on the command line, or prompt for it (input hidden).
fn resolve_password(given: Option<&str>, prompt: &str) -> Result<Zeroizing<String>> {
    match given {
        Some(password) => Ok(Zeroizing::new(password.to_string())),
        None => rpassword::prompt_password(prompt)
            .map(Zeroizing::new)
            .context("Failed to read password"),
    }
}
