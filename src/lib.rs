//! # GenStega - hide secrets in generated images
//!
//! GenStega seals a text secret with a password and a time limit, then hides
//! the sealed bytes in the pixel data of a freshly generated PNG.
//!
//! ## Overview
//!
//! - The password is stretched with **PBKDF2-HMAC-SHA256** over a fixed,
//!   configured salt, so the recipient derives the same key independently
//! - The secret and its expiry are sealed with **ChaCha20-Poly1305**
//! - The ciphertext is **LSB-packed** into an RGB cover behind a 32-bit length
//! - The stego image is always written as **PNG**; lossy re-encoding destroys it
//! - A per-conversation **state machine** collects text, files and passwords
//!
//! ## Security Model
//!
//! - **No oracle**: wrong password, tampered data and images without a payload
//!   fail identically
//! - **Expiry**: an authentic but expired secret is refused
//! - **Ephemeral**: session buffers live in RAM and are zeroized on reset
//!
//! ## Example Usage
//!
//! ```rust
//! use std::time::Duration;
//! use genstega::cover::ProceduralCover;
//! use genstega::crypto::KdfParams;
//! use genstega::{open_from_png, seal_into_cover};
//!
//! let params = KdfParams::default();
//! let cover = ProceduralCover::new().generate(256, 256);
//!
//! let png = seal_into_cover("meet at noon", "hunter2", Duration::from_secs(3600), &params, &cover)
//!     .unwrap();
//!
//! let secret = open_from_png(&png, "hunter2", &params).unwrap();
//! assert_eq!(secret, "meet at noon");
//! ```
//!
//! ## Modules
//!
//! - [`crypto`]: key derivation and secret envelopes
//! - [`stego`]: LSB embedding and extraction
//! - [`cover`]: cover image providers
//! - [`bot`]: session orchestration
//! - [`config`]: TOML configuration

pub mod bot;
pub mod config;
pub mod cover;
pub mod crypto;
pub mod stego;

// Re-export commonly used types at the crate root
pub use bot::{
    open_from_png, seal_into_cover, Inbound, InboundKind, Orchestrator, Outbound, PipelineError,
    Reply, SessionId, Upload,
};
pub use config::{AppConfig, ConfigError};
pub use crypto::{EnvelopeError, KdfParams};
pub use stego::StegoError;
