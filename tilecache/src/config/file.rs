//! Configuration file handling for ~/.tilecache/config.ini.
//!
//! ```ini
//! [source]
//! name = osm
//! url_template = https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png
//! subdomains = a,b,c
//!
//! [http]
//! user_agent = my-viewer/1.0
//! verify_tls = true
//! max_body_size = 4MB
//!
//! [store]
//! directory = ~/.tilecache/stores
//! ```

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::FetcherConfig;
use crate::http::HttpConfig;
use crate::source::{TemplateError, XyzTemplate};

/// Source name used when the file does not name one.
pub const DEFAULT_SOURCE_NAME: &str = "osm";

/// URL template used when the file does not give one.
pub const DEFAULT_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Check a tile source name before it becomes the store's file name.
///
/// Returns the reason the name is rejected.
pub fn check_source_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err("must be a non-empty name without path separators");
    }
    Ok(())
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// A key holds a value that cannot be used
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[source]` section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceSettings {
    pub name: String,
    pub url_template: String,
    pub subdomains: Vec<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_SOURCE_NAME.to_string(),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            subdomains: Vec::new(),
        }
    }
}

/// `[store]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreSettings {
    /// `None` keeps the store in the working directory.
    pub directory: Option<PathBuf>,
}

/// Parsed contents of a config file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub source: SourceSettings,
    pub http: HttpConfig,
    pub store: StoreSettings,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.tilecache/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(content)
            .map_err(|e| ConfigFileError::ReadError(ini::Error::Parse(e)))?;
        super::parser::parse_ini(&ini)
    }

    /// Fetcher settings described by this file.
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            http: self.http.clone(),
            store_name: self.source.name.clone(),
            store_dir: self.store.directory.clone(),
        }
    }

    /// The tile source described by the `[source]` section.
    pub fn url_source(&self) -> Result<XyzTemplate, TemplateError> {
        XyzTemplate::with_subdomains(
            self.source.name.clone(),
            self.source.url_template.clone(),
            self.source.subdomains.iter().cloned(),
        )
    }
}

/// Get the path to the config directory (~/.tilecache).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilecache")
}

/// Get the path to the config file (~/.tilecache/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
