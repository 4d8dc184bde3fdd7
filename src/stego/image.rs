//! LSB (Least Significant Bit) steganography for RGB rasters.
//!
//! Hides an opaque byte string in the least significant bits of pixel
//! channel values. Only lossless PNG is used for transport.
//!
//! Format: [4 bytes big-endian length] + [data bytes]
//! Channels are consumed in raster order (row-major, R,G,B per pixel), one
//! bit per channel, most significant bit of each byte first.

use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use thiserror::Error;

/// Length header size in bytes.
pub const HEADER_SIZE: usize = 4;

/// Channels per pixel used for hiding data (alpha is never used).
const CHANNELS: u64 = 3;

/// PNG file signature.
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Errors that can occur during image steganography.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StegoError {
    #[error("Image too small to hide data: need {needed} bytes, have capacity for {capacity}")]
    CapacityExceeded { needed: usize, capacity: usize },

    /// The length header is impossible for this image. Covers images that
    /// never carried data, recompressed images and corrupted bits alike.
    #[error("No hidden data found in image")]
    Malformed,

    #[error("Image load error: {0}")]
    ImageLoad(String),

    #[error("Image save error: {0}")]
    ImageSave(String),
}

/// Number of channel bits available in a `width` x `height` RGB raster.
fn capacity_bits(width: u32, height: u32) -> u64 {
    u64::from(width) * u64::from(height) * CHANNELS
}

/// Returns the number of payload bytes a `width` x `height` image can hold,
/// after the length header.
pub fn capacity(width: u32, height: u32) -> usize {
    let bytes = capacity_bits(width, height) / 8;
    usize::try_from(bytes)
        .unwrap_or(usize::MAX)
        .saturating_sub(HEADER_SIZE)
}

/// Hides `payload` in a copy of `cover`.
///
/// Fails with [`StegoError::CapacityExceeded`] instead of truncating when the
/// cover cannot hold the header plus the payload.
pub fn embed(cover: &RgbImage, payload: &[u8]) -> Result<RgbImage, StegoError> {
    let (width, height) = cover.dimensions();
    let available = capacity(width, height);
    let needed_bits = 8 * (HEADER_SIZE as u64 + payload.len() as u64);

    let declared = u32::try_from(payload.len()).map_err(|_| StegoError::CapacityExceeded {
        needed: payload.len(),
        capacity: available,
    })?;

    if needed_bits > capacity_bits(width, height) {
        return Err(StegoError::CapacityExceeded {
            needed: payload.len(),
            capacity: available,
        });
    }

    let mut channels = cover.as_raw().clone();
    let framed = declared.to_be_bytes().into_iter().chain(payload.iter().copied());

    let mut slots = channels.iter_mut();
    for byte in framed {
        for shift in (0..8).rev() {
            // Capacity was checked above, so there is always a next channel.
            if let Some(channel) = slots.next() {
                *channel = (*channel & 0xFE) | ((byte >> shift) & 1);
            }
        }
    }

    RgbImage::from_raw(width, height, channels)
        .ok_or_else(|| StegoError::ImageSave("pixel buffer size mismatch".to_string()))
}

/// Recovers the payload hidden by [`embed`].
///
/// Fails with [`StegoError::Malformed`] when the declared length cannot fit
/// in the image, without reading past the raster.
pub fn extract(stego: &RgbImage) -> Result<Vec<u8>, StegoError> {
    let channels = stego.as_raw();
    let (width, height) = stego.dimensions();

    if channels.len() < HEADER_SIZE * 8 {
        return Err(StegoError::Malformed);
    }

    let mut header = [0u8; HEADER_SIZE];
    for (byte, chunk) in header.iter_mut().zip(channels.chunks_exact(8)) {
        *byte = gather_byte(chunk);
    }
    let declared = u32::from_be_bytes(header) as usize;

    if declared > capacity(width, height) {
        return Err(StegoError::Malformed);
    }

    let start = HEADER_SIZE * 8;
    let end = start + declared * 8;

    Ok(channels[start..end].chunks_exact(8).map(gather_byte).collect())
}

/// Rebuilds one byte from the LSBs of eight channel values, MSB first.
fn gather_byte(chunk: &[u8]) -> u8 {
    chunk.iter().fold(0u8, |acc, channel| (acc << 1) | (channel & 1))
}

/// Returns true if `bytes` start with the PNG signature.
pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(PNG_SIGNATURE)
}

/// Decodes PNG bytes into an RGB raster.
pub fn decode_png(bytes: &[u8]) -> Result<RgbImage, StegoError> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| StegoError::ImageLoad(e.to_string()))?;
    Ok(image.to_rgb8())
}

/// Encodes an RGB raster as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, StegoError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| StegoError::ImageSave(e.to_string()))?;
    Ok(bytes)
}

/// Hides `payload` in `cover` and returns the stego image as PNG bytes.
pub fn embed_png(cover: &RgbImage, payload: &[u8]) -> Result<Vec<u8>, StegoError> {
    encode_png(&embed(cover, payload)?)
}

/// Extracts the payload from PNG bytes produced by [`embed_png`].
pub fn extract_png(bytes: &[u8]) -> Result<Vec<u8>, StegoError> {
    extract(&decode_png(bytes)?)
}
