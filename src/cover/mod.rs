//! Cover image providers.
//!
//! A provider hands out RGB rasters that the stego codec writes into. How the
//! content is produced does not matter to the codec; it only needs the agreed
//! dimensions and busy, non-uniform pixels.
//!
//! Remote providers may be slow or down, so the orchestrator always goes
//! through [`FallbackCover`], which bounds the call with a timeout and falls
//! back to the local [`ProceduralCover`].

mod fallback;
mod procedural;

pub use fallback::{FallbackCover, DEFAULT_COVER_TIMEOUT};
pub use procedural::{generate_cover, CoverStyle, ProceduralCover};

use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;
use thiserror::Error;

/// Errors a cover provider can report. Never shown to users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoverError {
    #[error("Cover provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cover provider unavailable: {0}")]
    Unavailable(String),

    #[error("Cover has wrong size: expected {expected:?}, got {got:?}")]
    WrongSize {
        /// Requested (width, height).
        expected: (u32, u32),
        /// Delivered (width, height).
        got: (u32, u32),
    },
}

/// Source of cover images.
#[async_trait]
pub trait CoverProvider: Send + Sync {
    /// Produce an RGB cover of exactly `width` x `height` pixels.
    async fn cover(&self, width: u32, height: u32) -> Result<RgbImage, CoverError>;

    /// Short name for logs.
    fn name(&self) -> &'static str {
        "cover"
    }
}
