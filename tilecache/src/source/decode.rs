//! Raster decoding of tile bodies.

use image::RgbaImage;
use thiserror::Error;

/// A tile body could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to decode tile image: {0}")]
pub struct DecodeError(pub String);

/// Turns raw encoded bytes (PNG, JPEG, ...) into a raster.
pub trait TileDecoder: Send + Sync {
    /// Decode `bytes` into an RGBA raster.
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, DecodeError>;
}

/// Decoder backed by the `image` crate; the format is guessed from content.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl TileDecoder for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
        image::load_from_memory(bytes)
            .map(|image| image.to_rgba8())
            .map_err(|e| DecodeError(e.to_string()))
    }
}
