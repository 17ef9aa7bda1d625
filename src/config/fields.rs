//! Seed field definitions loaded from config.toml
//!
//! The `[[fields]]` tables in config.toml describe custom field definitions that are
//! created on startup when no definition with the same key exists yet. Existing
//! definitions are never overwritten, so administrator edits survive restarts.

use crate::core::field::FieldDefinitionInput;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Field definitions to seed
    #[serde(default)]
    pub fields: Vec<FieldDefinitionInput>,
}

/// Loads seed configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field entry is missing `key`, `label` or `field_type`
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Path of the config file: `LAND_REGISTRY_CONFIG` or `./config.toml`.
#[must_use]
pub fn config_path() -> PathBuf {
    std::env::var("LAND_REGISTRY_CONFIG").map_or_else(|_| PathBuf::from("config.toml"), PathBuf::from)
}

/// Loads the seed configuration from the default location.
///
/// A missing file yields an empty configuration; a present but malformed file is an error.
pub fn load_default_config() -> Result<Config> {
    let path = config_path();
    if !path.exists() {
        tracing::warn!("No config file at {:?}, skipping field seeding", path);
        return Ok(Config::default());
    }
    load_config(path)
}
