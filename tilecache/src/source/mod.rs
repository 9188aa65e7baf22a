//! Injected collaborators of the fetch coordinator.
//!
//! - [`TileUrlSource`] maps a tile to the URL of its tile server.
//! - [`TileDecoder`] turns a raw response body into a raster.
//!
//! Both are plain traits so a concrete tile source (OSM, Bing, a local test
//! server) can be plugged in without touching the coordinator.

mod decode;
mod url;

pub use decode::{DecodeError, RasterDecoder, TileDecoder};
pub use url::{TemplateError, TileUrlSource, XyzTemplate};
