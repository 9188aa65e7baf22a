//! Outcome resolution for completed fetches.
//!
//! Runs after the loop has removed the request from the registry. Precedence
//! is network, then the tile store, then the placeholder. Exactly one tile is
//! delivered per call.

use std::sync::Arc;

use bytes::Bytes;
use image::RgbaImage;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, trace};

use crate::coord::TilePos;
use crate::http::FetchError;
use crate::source::{DecodeError, TileDecoder};
use crate::store::TileStore;
use crate::tile::{Tile, TileSink};

pub(crate) struct Resolver {
    store: Arc<dyn TileStore>,
    decoder: Arc<dyn TileDecoder>,
    sink: Arc<dyn TileSink>,
    placeholder: Arc<RgbaImage>,
    /// Background store writes are tracked here so shutdown can drain them.
    tracker: TaskTracker,
}

impl Resolver {
    pub(crate) fn new(
        store: Arc<dyn TileStore>,
        decoder: Arc<dyn TileDecoder>,
        sink: Arc<dyn TileSink>,
        placeholder: Arc<RgbaImage>,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            store,
            decoder,
            sink,
            placeholder,
            tracker,
        }
    }

    /// Turn a non-cancelled fetch result into exactly one delivery.
    pub(crate) async fn resolve(
        &self,
        pos: TilePos,
        url: String,
        result: Result<Bytes, FetchError>,
    ) {
        let fresh = match result {
            Ok(body) => match self.decode(body.clone()).await {
                Ok(image) => {
                    self.schedule_write(pos, body.clone());
                    Some(Tile::from_network(pos, image, body, &url))
                }
                Err(e) => {
                    error!(
                        zoom = pos.zoom(),
                        x = pos.x(),
                        y = pos.y(),
                        url = %url,
                        error = %e,
                        "Tile response could not be decoded"
                    );
                    None
                }
            },
            Err(e) => {
                error!(
                    zoom = pos.zoom(),
                    x = pos.x(),
                    y = pos.y(),
                    url = %url,
                    error = %e,
                    "Tile fetch failed"
                );
                None
            }
        };

        let tile = match fresh {
            Some(tile) => tile,
            None => self.fallback(pos).await,
        };

        trace!(tile = %pos, origin = %tile.origin(), "Delivering tile");
        self.sink.deliver(pos, tile);
    }

    /// Cached tile if the store has a decodable body, else the placeholder.
    async fn fallback(&self, pos: TilePos) -> Tile {
        let store = Arc::clone(&self.store);
        let decoder = Arc::clone(&self.decoder);

        let cached =
            tokio::task::spawn_blocking(move || read_cached(store.as_ref(), decoder.as_ref(), pos))
                .await
                .unwrap_or_else(|e| {
                    debug!(tile = %pos, error = %e, "Tile store lookup task failed");
                    None
                });

        match cached {
            Some((body, image)) => {
                debug!(zoom = pos.zoom(), x = pos.x(), y = pos.y(), "Serving tile from store");
                Tile::from_cache(pos, image, body)
            }
            None => {
                debug!(zoom = pos.zoom(), x = pos.x(), y = pos.y(), "Serving placeholder tile");
                Tile::placeholder(pos, Arc::clone(&self.placeholder))
            }
        }
    }

    async fn decode(&self, body: Bytes) -> Result<RgbaImage, DecodeError> {
        let decoder = Arc::clone(&self.decoder);
        tokio::task::spawn_blocking(move || decoder.decode(&body))
            .await
            .unwrap_or_else(|e| Err(DecodeError(e.to_string())))
    }

    /// Fire-and-forget write of a fresh body.
    fn schedule_write(&self, pos: TilePos, body: Bytes) {
        let store = Arc::clone(&self.store);
        self.tracker.spawn_blocking(move || match store.put(pos, &body) {
            Ok(()) => trace!(tile = %pos, bytes = body.len(), "Tile stored"),
            Err(e) => debug!(tile = %pos, error = %e, "Tile store write failed"),
        });
    }
}

fn read_cached(
    store: &dyn TileStore,
    decoder: &dyn TileDecoder,
    pos: TilePos,
) -> Option<(Bytes, RgbaImage)> {
    let body = match store.get(pos) {
        Ok(Some(body)) => body,
        Ok(None) => return None,
        Err(e) => {
            debug!(tile = %pos, error = %e, "Tile store read failed");
            return None;
        }
    };

    match decoder.decode(&body) {
        Ok(image) => Some((Bytes::from(body), image)),
        Err(e) => {
            debug!(tile = %pos, error = %e, "Stored tile could not be decoded");
            None
        }
    }
}
