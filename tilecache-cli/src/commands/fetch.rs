//! Fetch command - fetch one tile through the coordinator and save it.
//!
//! Runs the same network, store, placeholder precedence a map view gets, so
//! it doubles as a way to warm a store or check a tile server.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tilecache::config::ConfigFile;
use tilecache::coord::TilePos;
use tilecache::coordinator::TileFetcher;
use tilecache::placeholder::encode_png;
use tilecache::source::XyzTemplate;
use tilecache::tile::Tile;
use tokio::sync::mpsc;
use tracing::info;

use super::common::{source_name, write_file, TileArgs};
use crate::error::CliError;

/// Arguments for the fetch command.
#[derive(Debug, Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub tile: TileArgs,

    /// URL template with {z}, {x}, {y} (or {quadkey}) placeholders
    #[arg(long)]
    pub template: Option<String>,

    /// Tile source name; the store is <name>.db
    #[arg(long)]
    pub name: Option<String>,

    /// Output PNG file
    #[arg(long, short = 'o', default_value = "tile.png")]
    pub output: PathBuf,

    /// Verify the server's TLS certificate
    #[arg(long)]
    pub verify_tls: bool,

    /// Seconds to wait for a delivery
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

/// Run the fetch command.
pub fn run(args: FetchArgs, config: &ConfigFile) -> Result<(), CliError> {
    let pos = args.tile.pos()?;
    let config = apply_overrides(config, &args)?;
    let source = config
        .url_source()
        .map_err(|e| CliError::Config(e.to_string()))?;

    println!("Fetching tile {} from {}", pos, source.template());

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let tile = runtime.block_on(fetch_one(
        source,
        &config,
        pos,
        Duration::from_secs(args.timeout),
    ))?;

    let png = encode_png(tile.image()).map_err(|e| CliError::Encode(e.to_string()))?;
    write_file(&args.output, &png)?;

    println!("Origin: {}", tile.origin());
    if let Some(body) = tile.body() {
        println!("Body:   {} bytes", body.len());
    }
    println!("Saved:  {}", args.output.display());
    Ok(())
}

/// The config file with command-line overrides applied.
fn apply_overrides(config: &ConfigFile, args: &FetchArgs) -> Result<ConfigFile, CliError> {
    let mut config = config.clone();
    if let Some(template) = &args.template {
        config.source.url_template = template.clone();
    }
    if let Some(name) = &args.name {
        config.source.name = source_name(name)?;
    }
    if args.verify_tls {
        config.http.verify_tls = true;
    }
    Ok(config)
}

async fn fetch_one(
    source: XyzTemplate,
    config: &ConfigFile,
    pos: TilePos,
    timeout: Duration,
) -> Result<Tile, CliError> {
    let (tx, mut tiles) = mpsc::unbounded_channel();
    let fetcher = TileFetcher::builder(source, tx)
        .with_config(config.fetcher_config())
        .spawn()
        .map_err(CliError::Client)?;

    fetcher.request(pos);
    let delivered = tokio::time::timeout(timeout, tiles.recv()).await;

    // Waits for the store write of a fresh tile.
    fetcher.shutdown().await;

    match delivered {
        Ok(Some((_, tile))) => {
            info!(tile = %pos, origin = %tile.origin(), "Tile delivered");
            Ok(tile)
        }
        Ok(None) | Err(_) => Err(CliError::Timeout {
            pos,
            secs: timeout.as_secs(),
        }),
    }
}
