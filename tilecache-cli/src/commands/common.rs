//! Helpers shared by several commands.

use std::path::Path;

use clap::Args;
use tilecache::config::check_source_name;
use tilecache::coord::TilePos;

use crate::error::CliError;

/// Tile address arguments.
#[derive(Debug, Clone, Copy, Args)]
pub struct TileArgs {
    /// Zoom level (0-30)
    #[arg(long, short = 'z')]
    pub zoom: u8,

    /// Tile column
    #[arg(long, short = 'x')]
    pub x: u32,

    /// Tile row, counted from the north
    #[arg(long, short = 'y')]
    pub y: u32,
}

impl TileArgs {
    pub fn pos(&self) -> Result<TilePos, CliError> {
        Ok(TilePos::new(self.zoom, self.x, self.y)?)
    }
}

/// A `--name` value, held to the same rule as `[source] name`.
pub fn source_name(name: &str) -> Result<String, CliError> {
    check_source_name(name).map_err(|reason| {
        CliError::Config(format!("invalid source name '{}': {}", name, reason))
    })?;
    Ok(name.to_string())
}

/// Write `bytes` to `path`.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|error| CliError::FileWrite {
        path: path.to_path_buf(),
        error,
    })
}
