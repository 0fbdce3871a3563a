//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::CatalogConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Environment variables that override file values.
pub const ENV_BASE_URL: &str = "CATALOG_PRODUCTS_BASE_URL";
pub const ENV_CLIENT_ID: &str = "CATALOG_AUTH_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "CATALOG_AUTH_CLIENT_SECRET";

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<CatalogConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Parse TOML, apply overrides from `lookup`, then validate.
pub fn parse_config<F>(content: &str, lookup: F) -> Result<CatalogConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: CatalogConfig = toml::from_str(content)?;
    apply_overrides(&mut config, lookup);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn apply_overrides<F>(config: &mut CatalogConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_BASE_URL) {
        config.products_api.base_url = url;
    }
    if let Some(id) = lookup(ENV_CLIENT_ID) {
        config.auth.client_id = id;
    }
    if let Some(secret) = lookup(ENV_CLIENT_SECRET) {
        config.auth.client_secret = secret;
    }
}
