//! Delivered tiles.
//!
//! A [`Tile`] is what the rendering layer receives for a request: the decoded
//! raster, the raw bytes it came from, the tile's geographic bounds and where
//! it was obtained. Tiles reach the renderer through a [`TileSink`].

mod sink;

pub use sink::{FnSink, TileSink};

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use image::RgbaImage;

use crate::coord::{GeoRect, TilePos};

/// Where a delivered tile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileOrigin {
    /// Fresh response from the tile server.
    Network,
    /// Previously stored body, served because the network failed.
    Cache,
    /// Synthetic "no data" raster; neither network nor cache could serve.
    Placeholder,
}

impl fmt::Display for TileOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileOrigin::Network => write!(f, "network"),
            TileOrigin::Cache => write!(f, "cache"),
            TileOrigin::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// A tile ready for rendering.
///
/// Cloning is cheap: the raster and body are reference counted, and every
/// placeholder tile shares the same raster.
#[derive(Clone, Debug)]
pub struct Tile {
    pos: TilePos,
    image: Arc<RgbaImage>,
    body: Option<Bytes>,
    geometry: GeoRect,
    debug_label: Option<String>,
    origin: TileOrigin,
}

impl Tile {
    /// Tile built from a fresh network response.
    pub fn from_network(pos: TilePos, image: RgbaImage, body: Bytes, url: &str) -> Self {
        Self {
            pos,
            image: Arc::new(image),
            body: Some(body),
            geometry: pos.geo_rect(),
            debug_label: Some(debug_label(url, pos)),
            origin: TileOrigin::Network,
        }
    }

    /// Tile built from a stored body.
    pub fn from_cache(pos: TilePos, image: RgbaImage, body: Bytes) -> Self {
        Self {
            pos,
            image: Arc::new(image),
            body: Some(body),
            geometry: pos.geo_rect(),
            debug_label: None,
            origin: TileOrigin::Cache,
        }
    }

    /// Placeholder tile sharing `image`.
    pub fn placeholder(pos: TilePos, image: Arc<RgbaImage>) -> Self {
        Self {
            pos,
            image,
            body: None,
            geometry: pos.geo_rect(),
            debug_label: None,
            origin: TileOrigin::Placeholder,
        }
    }

    pub fn pos(&self) -> TilePos {
        self.pos
    }

    /// The decoded raster.
    pub fn image(&self) -> &Arc<RgbaImage> {
        &self.image
    }

    /// Raw encoded bytes; `None` for the placeholder.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Geographic bounds of the tile.
    pub fn geometry(&self) -> GeoRect {
        self.geometry
    }

    /// Source URL and coordinate, for network tiles.
    pub fn debug_label(&self) -> Option<&str> {
        self.debug_label.as_deref()
    }

    pub fn origin(&self) -> TileOrigin {
        self.origin
    }
}

fn debug_label(url: &str, pos: TilePos) -> String {
    format!("{}\ntile({},{},{})", url, pos.zoom(), pos.x(), pos.y())
}
