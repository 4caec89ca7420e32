//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Why a configuration could not be loaded.
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The file is not valid TOML for [`GatewayConfig`].
    Parse(toml::de::Error),
    /// The values parsed but break one or more rules.
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config: {}", e),
            ConfigError::Parse(e) => write!(f, "cannot parse config: {}", e),
            ConfigError::Validation(errors) => {
                let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "invalid config: {}", details.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

/// Deserialize TOML text, then apply the semantic checks.
///
/// Missing sections and fields take their defaults, so an empty document is
/// a valid configuration.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config = toml::from_str::<GatewayConfig>(content).map_err(ConfigError::Parse)?;
    validate_config(&config)
        .map(|()| config)
        .map_err(ConfigError::Validation)
}

/// Read the file at `path` and hand it to [`parse_config`].
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    fs::read_to_string(path)
        .map_err(ConfigError::Io)
        .and_then(|content| parse_config(&content))
}
