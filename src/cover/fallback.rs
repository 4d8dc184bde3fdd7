//! Time-bounded cover retrieval with a local fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;
use tracing::{debug, warn};

use super::{CoverError, CoverProvider, ProceduralCover};

/// Default time budget for the primary provider.
pub const DEFAULT_COVER_TIMEOUT: Duration = Duration::from_secs(6);

/// Wraps a primary provider with a timeout and a procedural fallback.
///
/// Never fails: a timeout, an error or a wrongly sized raster from the
/// primary all end in a locally generated cover.
#[derive(Clone)]
pub struct FallbackCover {
    primary: Arc<dyn CoverProvider>,
    fallback: ProceduralCover,
    timeout: Duration,
}

impl FallbackCover {
    /// Create a wrapper around `primary` with the given time budget.
    pub fn new(primary: Arc<dyn CoverProvider>, timeout: Duration) -> Self {
        Self {
            primary,
            fallback: ProceduralCover::new(),
            timeout,
        }
    }

    /// Replace the local fallback generator.
    pub fn with_fallback(mut self, fallback: ProceduralCover) -> Self {
        self.fallback = fallback;
        self
    }

    /// Time budget granted to the primary provider.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch a cover from the primary provider, or draw one locally.
    pub async fn cover_or_fallback(&self, width: u32, height: u32) -> RgbImage {
        match self.try_primary(width, height).await {
            Ok(image) => {
                debug!(provider = self.primary.name(), width, height, "cover ready");
                image
            }
            Err(e) => {
                warn!(provider = self.primary.name(), error = %e, "falling back to procedural cover");
                self.fallback.generate(width, height)
            }
        }
    }

    async fn try_primary(&self, width: u32, height: u32) -> Result<RgbImage, CoverError> {
        let image = tokio::time::timeout(self.timeout, self.primary.cover(width, height))
            .await
            .map_err(|_| CoverError::Timeout(self.timeout))??;

        if image.dimensions() != (width, height) {
            return Err(CoverError::WrongSize {
                expected: (width, height),
                got: image.dimensions(),
            });
        }

        Ok(image)
    }
}

#[async_trait]
impl CoverProvider for FallbackCover {
    async fn cover(&self, width: u32, height: u32) -> Result<RgbImage, CoverError> {
        Ok(self.cover_or_fallback(width, height).await)
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
