//! Configuration for the tile fetcher.
//!
//! [`FetcherConfig`] is what a [`TileFetcher`](crate::coordinator::TileFetcher)
//! is built from. [`ConfigFile`] loads the same settings, plus the tile source,
//! from `~/.tilecache/config.ini`.
//!
//! # Example
//!
//! ```
//! use tilecache::config::FetcherConfig;
//!
//! let config = FetcherConfig::new("osm")
//!     .with_store_dir("/var/cache/tiles")
//!     .with_verify_tls(true);
//!
//! assert_eq!(config.store_path().to_str(), Some("/var/cache/tiles/osm.db"));
//! ```

mod fetcher;
mod file;
mod parser;
mod size;

pub use fetcher::FetcherConfig;
pub use file::{
    check_source_name, config_directory, config_file_path, ConfigFile, ConfigFileError,
    SourceSettings, StoreSettings, DEFAULT_SOURCE_NAME, DEFAULT_URL_TEMPLATE,
};
pub use size::{format_size, parse_size, SizeParseError};
