//! Raster image parsing and lossless PNG encoding
//!
//! `decode` accepts transport text and yields RGB8 pixels; `encode` writes a
//! PNG container back to transport text. PNG is lossless, so
//! `decode(encode(x))` is pixel-identical to `x`.

use std::io::Cursor;

use image::{ImageFormat, RgbImage};

use crate::codec::base64;
use crate::error::{AppError, Result};

/// Decode base64 transport text into an RGB8 raster image
///
/// Fails with a codec error on malformed transport text or bytes that do not
/// parse as an image.
pub fn decode(encoded: &str) -> Result<RgbImage> {
    let bytes = base64::decode(encoded)?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| AppError::InvalidEncoding(format!("unparseable image bytes: {}", e)))?;
    Ok(image.to_rgb8())
}

/// Encode a raster image as base64 PNG transport text
pub fn encode(image: &RgbImage) -> Result<String> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| AppError::InvalidEncoding(format!("PNG encoding failed: {}", e)))?;
    Ok(base64::encode(buffer.get_ref()))
}
