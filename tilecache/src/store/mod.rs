//! Persistent tile store.
//!
//! The [`TileStore`] trait is the coordinator's view of the on-disk cache: a
//! key→blob map keyed by [`TilePos`] with first-write-wins inserts and point
//! lookups. [`SqliteTileStore`] is the production implementation, one SQLite
//! file per tile source.
//!
//! # Example
//!
//! ```no_run
//! use tilecache::coord::TilePos;
//! use tilecache::store::{SqliteTileStore, TileStore};
//!
//! let store = SqliteTileStore::open("osm");
//! let pos = TilePos::new(3, 2, 4).unwrap();
//! store.put(pos, &[0x89, 0x50, 0x4e, 0x47])?;
//! assert!(store.get(pos)?.is_some());
//! # Ok::<(), tilecache::store::StoreError>(())
//! ```

mod sqlite;

pub use sqlite::{SqliteTileStore, StoreStats};

use thiserror::Error;

use crate::coord::TilePos;

/// Errors raised by a tile store.
///
/// None of these reach the delivery callback; the coordinator logs them and
/// treats a failed read as a cache miss.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened or its schema created.
    #[error("Tile store unavailable: {0}")]
    Unavailable(String),

    /// A lookup failed.
    #[error("Tile store read failed: {0}")]
    ReadFailed(String),

    /// An insert failed.
    #[error("Tile store write failed: {0}")]
    WriteFailed(String),
}

/// Key→blob storage for raw tile bodies.
///
/// Implementations must be safe for concurrent callers and must never expose
/// a partially written row. Calls are blocking; async callers run them on the
/// blocking pool.
pub trait TileStore: Send + Sync {
    /// Insert `body` under `pos` unless a row already exists.
    ///
    /// An existing row is kept unchanged and no error is signalled.
    fn put(&self, pos: TilePos, body: &[u8]) -> Result<(), StoreError>;

    /// Look up the body stored under `pos`.
    fn get(&self, pos: TilePos) -> Result<Option<Vec<u8>>, StoreError>;
}
