//! tilecache CLI - command-line front end for the tilecache library.
//!
//! Fetches map tiles through the same network, store, placeholder path a map
//! view uses, and inspects the per-source tile stores.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::fetch::FetchArgs;
use error::CliError;
use runner::{load_config, CliRunner};

#[derive(Parser)]
#[command(name = "tilecache")]
#[command(version, about = "Online map tiles with a persistent offline cache", long_about = None)]
struct Cli {
    /// Config file (default: ~/.tilecache/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one tile and save it as PNG
    Fetch(FetchArgs),

    /// Inspect a tile store
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Write the "NO DATA" placeholder tile as PNG
    Placeholder {
        /// Output file
        #[arg(long, short = 'o', default_value = "placeholder.png")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Fetch(args) => {
            let runner = CliRunner::new(cli.config.as_deref())?;
            runner.log_startup("fetch");
            commands::fetch::run(args, runner.config())
        }
        Commands::Cache { action } => {
            let config = load_config(cli.config.as_deref())?;
            commands::cache::run(action, &config)
        }
        Commands::Placeholder { output } => commands::placeholder::run(&output),
    }
}
