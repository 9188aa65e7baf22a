//! Delivery of finished tiles to the rendering layer.

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::Tile;
use crate::coord::TilePos;

/// Receives finished tiles.
///
/// Called from runtime worker tasks, at most once per accepted request and
/// never for a cancelled one. Implementations must not block.
pub trait TileSink: Send + Sync {
    fn deliver(&self, pos: TilePos, tile: Tile);
}

impl TileSink for UnboundedSender<(TilePos, Tile)> {
    fn deliver(&self, pos: TilePos, tile: Tile) {
        if self.send((pos, tile)).is_err() {
            debug!(tile = %pos, "Tile receiver dropped, discarding delivery");
        }
    }
}

/// Adapts a closure into a [`TileSink`].
///
/// ```
/// use tilecache::tile::{FnSink, TileSink};
///
/// let sink = FnSink::new(|pos, tile| println!("{} from {}", pos, tile.origin()));
/// # let _ = &sink as &dyn TileSink;
/// ```
pub struct FnSink<F>(F);

impl<F> FnSink<F>
where
    F: Fn(TilePos, Tile) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> TileSink for FnSink<F>
where
    F: Fn(TilePos, Tile) + Send + Sync,
{
    fn deliver(&self, pos: TilePos, tile: Tile) {
        (self.0)(pos, tile)
    }
}
