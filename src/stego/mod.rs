//! Steganography module for hiding data in cover images.
//!
//! Supports:
//! - Image LSB steganography (RGB rasters, PNG transport)

pub mod image;

pub use self::image::{
    capacity, decode_png, embed, embed_png, encode_png, extract, extract_png, is_png, StegoError,
};
