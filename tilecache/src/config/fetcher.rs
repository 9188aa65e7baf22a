//! Settings a tile fetcher is constructed from.

use std::path::PathBuf;

use crate::http::HttpConfig;
use crate::store::SqliteTileStore;

/// Fetcher construction settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetcherConfig {
    /// HTTP client settings.
    pub http: HttpConfig,

    /// Tile source name; the store lives in `<name>.db`.
    pub store_name: String,

    /// Directory holding the store. `None` means the working directory.
    pub store_dir: Option<PathBuf>,
}

impl FetcherConfig {
    /// Defaults for the tile source `store_name`.
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            http: HttpConfig::default(),
            store_name: store_name.into(),
            store_dir: None,
        }
    }

    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.http = self.http.with_user_agent(user_agent);
        self
    }

    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.http = self.http.with_verify_tls(verify_tls);
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.http = self.http.with_max_body_bytes(max_body_bytes);
        self
    }

    /// Place the store in `dir` instead of the working directory.
    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = Some(dir.into());
        self
    }

    /// Full path of the store's database file.
    pub fn store_path(&self) -> PathBuf {
        self.tile_store().path().to_path_buf()
    }

    /// The store these settings describe. Opening is deferred to first use.
    pub fn tile_store(&self) -> SqliteTileStore {
        match &self.store_dir {
            Some(dir) => SqliteTileStore::open_in(dir, &self.store_name),
            None => SqliteTileStore::open(&self.store_name),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self::new(super::DEFAULT_SOURCE_NAME)
    }
}
