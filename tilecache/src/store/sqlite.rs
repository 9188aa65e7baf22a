//! SQLite-backed tile store.
//!
//! One database file per tile source, holding a single table:
//!
//! ```text
//! Tiles(zoom INTEGER, pos_x INTEGER, pos_y INTEGER, data BLOB,
//!       PRIMARY KEY(zoom, pos_x, pos_y))
//! ```
//!
//! The connection is opened lazily on first access and guarded by one
//! exclusive lock, held only for the duration of a single SQL call.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use super::{StoreError, TileStore};
use crate::coord::TilePos;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS Tiles (
    zoom INTEGER,
    pos_x INTEGER,
    pos_y INTEGER,
    data BLOB,
    PRIMARY KEY (zoom, pos_x, pos_y)
)";

const INSERT_SQL: &str =
    "INSERT OR IGNORE INTO Tiles (zoom, pos_x, pos_y, data) VALUES (?1, ?2, ?3, ?4)";

const SELECT_SQL: &str = "SELECT data FROM Tiles WHERE zoom = ?1 AND pos_x = ?2 AND pos_y = ?3";

const STATS_SQL: &str = "SELECT COUNT(*), COALESCE(SUM(LENGTH(data)), 0) FROM Tiles";

/// How long a statement waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Row count and payload size of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of stored tiles.
    pub rows: u64,
    /// Sum of all stored tile bodies in bytes.
    pub bytes: u64,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tiles, {} bytes", self.rows, self.bytes)
    }
}

/// Tile store persisted in a SQLite file.
pub struct SqliteTileStore {
    path: PathBuf,
    connection: Mutex<Option<Connection>>,
}

impl SqliteTileStore {
    /// Store for the tile source `name`, at `<cwd>/<name>.db`.
    ///
    /// Nothing touches the filesystem until the first access.
    pub fn open(name: &str) -> Self {
        let dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::open_in(dir, name)
    }

    /// Store for the tile source `name`, at `<dir>/<name>.db`.
    pub fn open_in(dir: impl AsRef<Path>, name: &str) -> Self {
        Self::at_path(dir.as_ref().join(format!("{}.db", name)))
    }

    /// Store backed by the database file at `path`.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            connection: Mutex::new(None),
        }
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the database and create the schema now instead of on first use.
    pub fn open_now(&self) -> Result<(), StoreError> {
        let mut slot = self.connection.lock();
        self.connection_in(&mut slot).map(|_| ())
    }

    /// Number of rows and total payload bytes.
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let mut slot = self.connection.lock();
        let connection = self.connection_in(&mut slot)?;
        connection
            .query_row(STATS_SQL, [], |row| {
                Ok(StoreStats {
                    rows: row.get::<_, i64>(0)? as u64,
                    bytes: row.get::<_, i64>(1)? as u64,
                })
            })
            .map_err(|e| StoreError::ReadFailed(e.to_string()))
    }

    fn connection_in<'a>(
        &self,
        slot: &'a mut Option<Connection>,
    ) -> Result<&'a Connection, StoreError> {
        let connection = match slot.take() {
            Some(connection) => connection,
            None => open_connection(&self.path)?,
        };
        Ok(slot.insert(connection))
    }
}

impl fmt::Debug for SqliteTileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteTileStore")
            .field("path", &self.path)
            .field("open", &self.connection.lock().is_some())
            .finish()
    }
}

impl TileStore for SqliteTileStore {
    fn put(&self, pos: TilePos, body: &[u8]) -> Result<(), StoreError> {
        let mut slot = self.connection.lock();
        let connection = self.connection_in(&mut slot)?;
        connection
            .prepare_cached(INSERT_SQL)
            .and_then(|mut stmt| stmt.execute(params![pos.zoom(), pos.x(), pos.y(), body]))
            .map(|_| ())
            .map_err(|e| StoreError::WriteFailed(e.to_string()))
    }

    fn get(&self, pos: TilePos) -> Result<Option<Vec<u8>>, StoreError> {
        let mut slot = self.connection.lock();
        let connection = self.connection_in(&mut slot)?;
        connection
            .prepare_cached(SELECT_SQL)
            .and_then(|mut stmt| {
                stmt.query_row(params![pos.zoom(), pos.x(), pos.y()], |row| {
                    row.get::<_, Vec<u8>>(0)
                })
                .optional()
            })
            .map_err(|e| StoreError::ReadFailed(e.to_string()))
    }
}

fn open_connection(path: &Path) -> Result<Connection, StoreError> {
    let unavailable =
        |e: rusqlite::Error| StoreError::Unavailable(format!("{}: {}", path.display(), e));

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let connection = Connection::open_with_flags(path, flags).map_err(unavailable)?;
    connection.busy_timeout(BUSY_TIMEOUT).map_err(unavailable)?;
    connection
        .execute_batch("PRAGMA journal_mode = WAL;")
        .map_err(unavailable)?;
    connection
        .execute_batch(CREATE_TABLE_SQL)
        .map_err(unavailable)?;

    debug!(path = %path.display(), "Opened tile store");
    Ok(connection)
}
