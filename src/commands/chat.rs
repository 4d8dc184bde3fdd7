//! Chat command - drive the conversation bot from the terminal.
//!
//! Stands in for a messaging transport: every stdin line becomes an inbound
//! event for one local session.
//!
//! ## Input
//!
//! - `/encode`, `/decode`, `/cancel`, `/start` - bot commands
//! - `/file <path>` - upload a file as a raw document
//! - `/photo` - simulate a compressed photo upload
//! - anything else - a text message

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

use genstega::{AppConfig, Inbound, InboundKind, Orchestrator, Outbound, SessionId, Upload};

use super::CommandExecutor;

/// Talk to the bot interactively.
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Session id to use for this conversation
    #[arg(long, default_value_t = 1)]
    pub session: i64,

    /// Directory where received files are saved
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

impl CommandExecutor for ChatCommand {
    fn execute(&self, config: &AppConfig) -> Result<()> {
        let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
        rt.block_on(self.run(config.clone()))
    }
}

impl ChatCommand {
    async fn run(&self, config: AppConfig) -> Result<()> {
        let bot = Orchestrator::with_local_covers(config);
        let sweeper = bot.spawn_sweeper();
        let id = SessionId(self.session);

        eprintln!("Connected as session {}. Type /start for help, Ctrl+D to quit.", id);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            let inbound = match parse_line(id, &line) {
                Ok(inbound) => inbound,
                Err(e) => {
                    eprintln!("{:#}", e);
                    continue;
                }
            };

            for outbound in bot.handle(inbound).await {
                self.deliver(outbound)?;
            }
        }

        sweeper.abort();
        Ok(())
    }

    fn deliver(&self, outbound: Outbound) -> Result<()> {
        match outbound {
            Outbound::Text(reply) => println!("{}\n", reply),
            Outbound::File {
                file_name,
                bytes,
                caption,
            } => {
                let path = self.out_dir.join(file_name);
                std::fs::write(&path, &bytes)
                    .with_context(|| format!("Failed to save {}", path.display()))?;
                println!("[file saved to {}]\n{}\n", path.display(), caption);
            }
        }
        Ok(())
    }
}

/// Turns one line of terminal input into an inbound event.
fn parse_line(id: SessionId, line: &str) -> Result<Inbound> {
    let trimmed = line.trim();

    if trimmed == "/file" {
        anyhow::bail!("Usage: /file <path>");
    }

    if let Some(rest) = trimmed.strip_prefix("/file ") {
        let path = Path::new(rest.trim());
        if path.as_os_str().is_empty() {
            anyhow::bail!("Usage: /file <path>");
        }
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let upload = Upload::new(
            path.file_name().map(|n| n.to_string_lossy().into_owned()),
            mime_from_extension(path).map(str::to_string),
            bytes,
        );
        return Ok(Inbound::new(id, InboundKind::Document(upload)));
    }

    if trimmed == "/photo" {
        return Ok(Inbound::new(id, InboundKind::Photo));
    }

    Ok(Inbound::from_text(id, line))
}

/// MIME type a messaging client would declare for this file.
fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => Some("application/octet-stream"),
    }
}
