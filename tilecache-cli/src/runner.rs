//! Common setup shared by the commands that talk to a tile server.

use std::path::Path;

use tilecache::config::ConfigFile;
use tilecache::logging::{default_log_dir, default_log_file, init_logging, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Holds the logging guard and the loaded configuration for one command run.
pub struct CliRunner {
    _logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load configuration and start logging to `logs/tilecache.log`.
    ///
    /// `config_path` overrides the default `~/.tilecache/config.ini`.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = load_config(config_path)?;
        let logging_guard =
            init_logging(default_log_dir(), default_log_file()).map_err(CliError::LoggingInit)?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log the start of a command.
    pub fn log_startup(&self, command: &str) {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            command,
            source = %self.config.source.name,
            "tilecache starting"
        );
    }
}

/// Load the config file at `path`, or the default one.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let loaded = match path {
        Some(path) => ConfigFile::load_from(path),
        None => ConfigFile::load(),
    };
    loaded.map_err(|e| CliError::Config(e.to_string()))
}
