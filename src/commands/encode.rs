//! Encode command - hide a secret in a PNG image.

use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use image::RgbImage;
use tracing::info;
use zeroize::Zeroizing;

use genstega::cover::ProceduralCover;
use genstega::{seal_into_cover, AppConfig};

use super::{resolve_password, CommandExecutor};

/// Hide a secret in a PNG image.
///
/// Without --cover, a fresh procedural cover is generated. A supplied cover
/// may be any format the image decoder understands; the output is always PNG.
#[derive(Args, Debug)]
pub struct EncodeCommand {
    /// Secret text to hide (read from stdin if omitted)
    #[arg(short, long)]
    pub message: Option<String>,

    /// Password (prompted with hidden input if omitted)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Where to write the stego PNG
    #[arg(short, long, default_value = "secret_image.png")]
    pub output: PathBuf,

    /// Use this image as the cover instead of generating one
    #[arg(short, long)]
    pub cover: Option<PathBuf>,

    /// Secret lifetime: "+30m", "+24h", "+7d" (default from config)
    #[arg(long)]
    pub ttl: Option<String>,
}

impl CommandExecutor for EncodeCommand {
    fn execute(&self, config: &AppConfig) -> Result<()> {
        let message = match &self.message {
            Some(m) => Zeroizing::new(m.clone()),
            None => {
                eprintln!("Reading message from stdin (Ctrl+D to finish):");
                let mut buffer = Zeroizing::new(String::new());
                io::stdin()
                    .read_to_string(&mut buffer)
                    .context("Failed to read message from stdin")?;
                Zeroizing::new(buffer.trim_end().to_string())
            }
        };

        let max_chars = config.session.max_secret_chars;
        if message.chars().count() > max_chars {
            anyhow::bail!("Message is longer than {} characters", max_chars);
        }

        let ttl = match &self.ttl {
            Some(raw) => parse_ttl(raw).with_context(|| {
                format!("Invalid TTL format: '{}'. Use '+30m', '+24h' or '+7d'", raw)
            })?,
            None => config.envelope.ttl(),
        };

        let cover = self.load_cover(config)?;
        let password = resolve_password(self.password.as_deref(), "Password: ")?;

        let png = seal_into_cover(&message, &password, ttl, &config.kdf.params(), &cover)
            .context("Failed to hide message")?;

        std::fs::write(&self.output, &png)
            .with_context(|| format!("Failed to write {}", self.output.display()))?;

        info!(bytes = png.len(), ttl_secs = ttl.as_secs(), "stego image written");
        eprintln!("Hidden message written to {}", self.output.display());
        eprintln!("Send it as a file, never as a compressed photo.");
        Ok(())
    }
}

impl EncodeCommand {
    fn load_cover(&self, config: &AppConfig) -> Result<RgbImage> {
        match &self.cover {
            Some(path) => {
                let image = image::open(path)
                    .with_context(|| format!("Failed to read cover {}", path.display()))?;
                Ok(image.to_rgb8())
            }
            None => Ok(ProceduralCover::new().generate(config.cover.width, config.cover.height)),
        }
    }
}

/// Parses a relative lifetime such as "+30m", "2h" or "+7d".
fn parse_ttl(input: &str) -> Option<Duration> {
    let input = input.trim();
    let input = input.strip_prefix('+').unwrap_or(input);

    let suffix = input.chars().last()?;
    let value: u64 = input[..input.len() - suffix.len_utf8()].parse().ok()?;

    let seconds = match suffix {
        's' => value,
        'm' => value.checked_mul(60)?,
        'h' => value.checked_mul(60 * 60)?,
        'd' => value.checked_mul(60 * 60 * 24)?,
        'w' => value.checked_mul(60 * 60 * 24 * 7)?,
        _ => return None,
    };

    Some(Duration::from_secs(seconds))
}
