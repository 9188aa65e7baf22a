//! In-flight request registry.
//!
//! Tracks at most one [`FetchHandle`] per [`TilePos`]. The registry owns its
//! handles: removing an entry drops the handle, which aborts the fetch. Each
//! accepted request is tagged with a [`RequestId`] so the completion path can
//! tell its own entry apart from one created by a later request for the same
//! tile.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::trace;

use crate::coord::TilePos;
use crate::http::FetchHandle;

/// Identity of one accepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    /// Wrap a raw id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The id that follows this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A fetch for this tile is already in flight. The rejected handle is
    /// returned to the caller; dropping it aborts the redundant fetch.
    #[error("Tile {pos} already has a pending request")]
    AlreadyPending { pos: TilePos, handle: FetchHandle },
}

struct Entry {
    id: RequestId,
    handle: FetchHandle,
}

/// Map of in-flight fetches keyed by tile.
#[derive(Default)]
pub struct RequestRegistry {
    entries: HashMap<TilePos, Entry>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the fetch for `pos`.
    pub fn insert(
        &mut self,
        pos: TilePos,
        id: RequestId,
        handle: FetchHandle,
    ) -> Result<(), RegistryError> {
        if self.entries.contains_key(&pos) {
            return Err(RegistryError::AlreadyPending { pos, handle });
        }
        self.entries.insert(pos, Entry { id, handle });
        Ok(())
    }

    /// Abort and release the fetch for `pos`, if any.
    ///
    /// Returns true if an entry was removed.
    pub fn remove(&mut self, pos: TilePos) -> bool {
        match self.entries.remove(&pos) {
            Some(entry) => {
                entry.handle.abort();
                trace!(tile = %pos, request = %entry.id, "Removed pending request");
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `pos` only if it belongs to request `id`.
    ///
    /// Used by the completion path. Returns false for a stale completion,
    /// i.e. one whose request was already removed.
    pub fn complete(&mut self, pos: TilePos, id: RequestId) -> bool {
        match self.entries.get(&pos) {
            Some(entry) if entry.id == id => self.remove(pos),
            _ => false,
        }
    }

    /// Abort and release every entry.
    pub fn remove_all(&mut self) -> usize {
        let count = self.entries.len();
        for (_, entry) in self.entries.drain() {
            entry.handle.abort();
        }
        count
    }

    /// Returns true if a fetch for `pos` is in flight.
    pub fn contains(&self, pos: TilePos) -> bool {
        self.entries.contains_key(&pos)
    }

    /// Number of in-flight fetches.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for RequestRegistry {
    fn drop(&mut self) {
        self.remove_all();
    }
}
