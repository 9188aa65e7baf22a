//! Maps INI sections and keys onto [`ConfigFile`] fields.

use std::path::PathBuf;

use ini::Ini;

use super::file::{check_source_name, ConfigFile, ConfigFileError};
use super::size::parse_size;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [source] section
    if let Some(section) = ini.section(Some("source")) {
        if let Some(v) = section.get("name") {
            let v = v.trim();
            if let Err(reason) = check_source_name(v) {
                return Err(invalid("source", "name", v, reason));
            }
            config.source.name = v.to_string();
        }
        if let Some(v) = section.get("url_template") {
            let v = v.trim();
            if !v.is_empty() {
                config.source.url_template = v.to_string();
            }
        }
        if let Some(v) = section.get("subdomains") {
            config.source.subdomains = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    // [http] section
    if let Some(section) = ini.section(Some("http")) {
        if let Some(v) = section.get("user_agent") {
            let v = v.trim();
            if !v.is_empty() {
                config.http.user_agent = v.to_string();
            }
        }
        if let Some(v) = section.get("verify_tls") {
            config.http.verify_tls = parse_bool(v)
                .ok_or_else(|| invalid("http", "verify_tls", v, "must be true or false"))?;
        }
        if let Some(v) = section.get("max_body_size") {
            let size = parse_size(v).map_err(|_| {
                invalid(
                    "http",
                    "max_body_size",
                    v,
                    "expected format like '4MB', '512KB' or '1048576'",
                )
            })?;
            if size == 0 {
                return Err(invalid("http", "max_body_size", v, "must be greater than zero"));
            }
            config.http.max_body_bytes = size;
        }
    }

    // [store] section
    if let Some(section) = ini.section(Some("store")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.store.directory = Some(expand_tilde(v));
            }
        }
    }

    // The template is checked here so a bad file fails at load time.
    if let Err(e) = config.url_source() {
        return Err(invalid(
            "source",
            "url_template",
            &config.source.url_template,
            &e.to_string(),
        ));
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
