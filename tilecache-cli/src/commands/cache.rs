//! Cache commands - inspect the tile store of a source.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use tilecache::config::{format_size, ConfigFile};
use tilecache::store::{SqliteTileStore, TileStore};

use super::common::{source_name, write_file, TileArgs};
use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Write the stored body of one tile to a file
    Get {
        #[command(flatten)]
        tile: TileArgs,

        /// Tile source name (defaults to the configured source)
        #[arg(long)]
        name: Option<String>,

        /// Output file
        #[arg(long, short = 'o', default_value = "tile.bin")]
        output: PathBuf,
    },
    /// Show tile count and total size of a store
    Stats {
        /// Tile source name (defaults to the configured source)
        #[arg(long)]
        name: Option<String>,
    },
}

/// Run a cache subcommand.
pub fn run(action: CacheAction, config: &ConfigFile) -> Result<(), CliError> {
    match action {
        CacheAction::Get { tile, name, output } => {
            let store = open_store(config, name)?;
            let pos = tile.pos()?;

            match store.get(pos)? {
                Some(body) => {
                    write_file(&output, &body)?;
                    println!(
                        "Wrote {} ({}) to {}",
                        pos,
                        format_size(body.len()),
                        output.display()
                    );
                    Ok(())
                }
                None => Err(CliError::NotCached {
                    pos,
                    store: store.path().to_path_buf(),
                }),
            }
        }
        CacheAction::Stats { name } => {
            let store = open_store(config, name)?;
            print_stats(&store)
        }
    }
}

fn open_store(config: &ConfigFile, name: Option<String>) -> Result<SqliteTileStore, CliError> {
    let mut fetcher_config = config.fetcher_config();
    if let Some(name) = name {
        fetcher_config.store_name = source_name(&name)?;
    }
    Ok(fetcher_config.tile_store())
}

fn print_stats(store: &SqliteTileStore) -> Result<(), CliError> {
    let path: &Path = store.path();
    println!("Tile store: {}", path.display());

    if !path.exists() {
        println!("  (not created yet)");
        return Ok(());
    }

    let stats = store.stats()?;
    println!("  Tiles: {}", stats.rows);
    println!("  Size:  {}", format_size(stats.bytes as usize));
    Ok(())
}
