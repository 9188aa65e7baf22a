//! CLI error handling with user-friendly messages.

use std::fmt;
use std::path::PathBuf;
use std::process;

use tilecache::coord::{CoordError, TilePos};
use tilecache::http::FetchError;
use tilecache::store::StoreError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration error
    Config(String),
    /// Tile coordinates out of range
    InvalidTile(CoordError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to build the HTTP client
    Client(FetchError),
    /// No tile was delivered in time
    Timeout { pos: TilePos, secs: u64 },
    /// Tile store could not be read
    Store(StoreError),
    /// The requested tile is not in the store
    NotCached { pos: TilePos, store: PathBuf },
    /// Failed to encode an image
    Encode(String),
    /// Failed to write output file
    FileWrite { path: PathBuf, error: std::io::Error },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotCached { .. } => 2,
            CliError::Timeout { .. } => 3,
            _ => 1,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Check the [source], [http] and [store] sections of your config file.");
            }
            CliError::Timeout { .. } => {
                eprintln!();
                eprintln!("The server did not answer. Try a longer --timeout.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InvalidTile(e) => write!(f, "Invalid tile: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Client(e) => write!(f, "{}", e),
            CliError::Timeout { pos, secs } => {
                write!(f, "No tile delivered for {} within {}s", pos, secs)
            }
            CliError::Store(e) => write!(f, "{}", e),
            CliError::NotCached { pos, store } => {
                write!(f, "Tile {} is not in {}", pos, store.display())
            }
            CliError::Encode(msg) => write!(f, "Failed to encode image: {}", msg),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::InvalidTile(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Client(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::InvalidTile(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}
