//! Runtime configuration.
//!
//! Loaded from an optional TOML file. Every field has a default, so an empty
//! file (or no file) yields a working setup.
//!
//! ```toml
//! [kdf]
//! salt = "genstega-static-salt-v1"
//! iterations = 100000
//!
//! [envelope]
//! ttl_minutes = 60
//!
//! [cover]
//! width = 512
//! height = 512
//! timeout_secs = 6
//!
//! [session]
//! idle_timeout_secs = 1800
//! sweep_interval_secs = 60
//! max_secret_chars = 4096
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::envelope::{NONCE_SIZE, TAG_SIZE};
use crate::crypto::kdf::{KdfParams, DEFAULT_ITERATIONS, DEFAULT_SALT, MIN_ITERATIONS};
use crate::stego;

/// Default secret lifetime in minutes.
pub const DEFAULT_TTL_MINUTES: u64 = 60;

/// Default cover width in pixels.
pub const DEFAULT_COVER_WIDTH: u32 = 512;

/// Default cover height in pixels.
pub const DEFAULT_COVER_HEIGHT: u32 = 512;

/// Default time budget for the cover provider, in seconds.
pub const DEFAULT_COVER_TIMEOUT_SECS: u64 = 6;

/// Default idle time after which a session is evicted, in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 30 * 60;

/// Default interval between idle sweeps, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Default maximum secret length in characters.
pub const DEFAULT_MAX_SECRET_CHARS: usize = 4096;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Key derivation settings. Both parties must use the same values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    /// Fixed, non-secret PBKDF2 salt.
    pub salt: String,

    /// PBKDF2 round count.
    pub iterations: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            salt: String::from_utf8_lossy(DEFAULT_SALT).into_owned(),
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfConfig {
    /// Parameters for the envelope codec.
    pub fn params(&self) -> KdfParams {
        KdfParams::new(self.salt.as_bytes().to_vec(), self.iterations)
    }
}

/// Envelope settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Lifetime of a sealed secret in minutes.
    pub ttl_minutes: u64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: DEFAULT_TTL_MINUTES,
        }
    }
}

impl EnvelopeConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }
}

/// Cover image settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    pub width: u32,
    pub height: u32,

    /// Time budget for the cover provider before falling back, in seconds.
    pub timeout_secs: u64,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_COVER_WIDTH,
            height: DEFAULT_COVER_HEIGHT,
            timeout_secs: DEFAULT_COVER_TIMEOUT_SECS,
        }
    }
}

impl CoverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Session table settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions idle longer than this are evicted, in seconds.
    pub idle_timeout_secs: u64,

    /// Interval between idle sweeps, in seconds.
    pub sweep_interval_secs: u64,

    /// Longest secret accepted, in characters.
    pub max_secret_chars: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            max_secret_chars: DEFAULT_MAX_SECRET_CHARS,
        }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub kdf: KdfConfig,
    pub envelope: EnvelopeConfig,
    pub cover: CoverConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the codecs rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kdf.iterations < MIN_ITERATIONS {
            return Err(ConfigError::Invalid(format!(
                "kdf.iterations must be at least {}, got {}",
                MIN_ITERATIONS, self.kdf.iterations
            )));
        }

        if self.cover.width == 0 || self.cover.height == 0 {
            return Err(ConfigError::Invalid(
                "cover dimensions must be non-zero".to_string(),
            ));
        }

        let needed = worst_case_ciphertext_len(self.session.max_secret_chars);
        let available = stego::capacity(self.cover.width, self.cover.height);
        if needed > available {
            return Err(ConfigError::Invalid(format!(
                "a {}x{} cover holds {} bytes but a {}-character secret may need {}",
                self.cover.width,
                self.cover.height,
                available,
                self.session.max_secret_chars,
                needed
            )));
        }

        Ok(())
    }
}

/// Largest ciphertext a secret of `chars` characters can produce.
///
/// UTF-8 uses at most 4 bytes per character; bincode adds an 8-byte string
/// length and the 8-byte expiry.
pub fn worst_case_ciphertext_len(chars: usize) -> usize {
    NONCE_SIZE + TAG_SIZE + 8 + chars.saturating_mul(4) + 8
}
