//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{ApiDescription, GatewayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid API description {}: {source}", .path.display())]
    ApiDescription {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

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

/// Load, merge and validate configuration from a TOML file.
///
/// A relative `routes_file` is resolved against the config file's directory.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: GatewayConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(routes_file) = config.routes_file.take() {
        let resolved = match path.parent() {
            Some(dir) if routes_file.is_relative() => dir.join(&routes_file),
            _ => routes_file,
        };
        let description = load_api_description(&resolved)?;
        config.routes.extend(description.routes);
        config.routes_file = Some(resolved);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load a JSON API description (`{"version": .., "routes": {..}}`).
pub fn load_api_description(path: &Path) -> Result<ApiDescription, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::ApiDescription {
        path: path.to_path_buf(),
        source,
    })
}
