//! Configuration module for PrabhAI routing
//!
//! Routing lists, provider endpoints and the retry policy are read once at
//! process start from a YAML or JSON file. `${VAR}` placeholders in the file
//! are replaced from the environment before parsing.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{
    ConnectionConfig, PrabhaiConfig, ProviderConfig, ProviderKind, RetryConfig, RoutingConfig,
    CONFIG_VERSION,
};
pub use secrets::SecretString;
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;

/// Environment variable naming the config file for `load_from_env`
pub const CONFIG_PATH_ENV: &str = "PRABHAI_CONFIG";

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<PrabhaiConfig> {
    let path = path.as_ref();
    let content = read_file(path)?;
    parse_yaml(&content, &path.to_string_lossy())
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<PrabhaiConfig> {
    let path = path.as_ref();
    let content = read_file(path)?;
    parse_json(&content, &path.to_string_lossy())
}

/// Load a configuration file, choosing the format from its extension
pub fn load_from_path<P: AsRef<Path>>(path: P) -> ConfigResult<PrabhaiConfig> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => load_from_yaml(path),
        Some("json") => load_from_json(path),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_string_lossy().to_string(),
        }),
    }
}

/// Load the configuration file named by `PRABHAI_CONFIG`
pub fn load_from_env() -> ConfigResult<PrabhaiConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).map_err(|_| ConfigError::EnvVarNotFound {
        var: CONFIG_PATH_ENV.to_string(),
    })?;
    load_from_path(path)
}

/// Parse and validate YAML configuration text
pub fn from_yaml_str(content: &str) -> ConfigResult<PrabhaiConfig> {
    parse_yaml(content, "<inline>")
}

/// Parse and validate JSON configuration text
pub fn from_json_str(content: &str) -> ConfigResult<PrabhaiConfig> {
    parse_json(content, "<inline>")
}

fn read_file(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

fn parse_yaml(content: &str, origin: &str) -> ConfigResult<PrabhaiConfig> {
    let interpolated = env::interpolate_env_vars(content)?;

    let config: PrabhaiConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: origin.to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

fn parse_json(content: &str, origin: &str) -> ConfigResult<PrabhaiConfig> {
    let interpolated = env::interpolate_env_vars(content)?;

    let config: PrabhaiConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: origin.to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}
