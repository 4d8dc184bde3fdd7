//! Encode and decode pipelines.
//!
//! Blocking, CPU-bound functions that chain the envelope codec and the stego
//! codec. The orchestrator runs them on the blocking thread pool; the CLI
//! calls them directly.

use std::time::Duration;

use image::RgbImage;

use crate::crypto::{self, KdfParams};
use crate::stego;

use super::error::PipelineError;

/// File name used for produced stego images.
pub const STEGO_FILE_NAME: &str = "secret_image.png";

/// Seal `text` and hide it in `cover`. Returns PNG bytes.
pub fn seal_into_cover(
    text: &str,
    password: &str,
    ttl: Duration,
    params: &KdfParams,
    cover: &RgbImage,
) -> Result<Vec<u8>, PipelineError> {
    let ciphertext = crypto::encrypt(text, password, ttl, params)?;
    Ok(stego::embed_png(cover, &ciphertext)?)
}

/// Pull the payload out of a stego PNG and open it.
pub fn open_from_png(png: &[u8], password: &str, params: &KdfParams) -> Result<String, PipelineError> {
    let payload = stego::extract_png(png)?;
    Ok(crypto::decrypt(&payload, password, params)?)
}
