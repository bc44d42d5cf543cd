//! Environment variable interpolation for configuration

use super::error::ConfigError;
use regex::{Captures, Regex};
use std::env;

/// `${VAR}` or `${VAR:-fallback}`
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}";

fn env_var_regex() -> Result<Regex, ConfigError> {
    Regex::new(ENV_VAR_PATTERN).map_err(|e| ConfigError::Interpolation {
        message: format!("bad interpolation pattern: {}", e),
    })
}

/// Interpolate environment variables in a configuration string.
///
/// Unset variables without a `:-` fallback are an error; the first one found
/// is reported.
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let pattern = env_var_regex()?;
    let mut missing: Option<String> = None;

    let result = pattern.replace_all(content, |cap: &Captures| {
        let var_name = &cap[1];
        match (env::var(var_name), cap.get(2)) {
            (Ok(value), _) => value,
            (Err(_), Some(fallback)) => fallback.as_str().to_string(),
            (Err(_), None) => {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var) => Err(ConfigError::EnvVarNotFound { var }),
        None => Ok(result.into_owned()),
    }
}

/// Names of `${VAR}` placeholders still present in `value`
pub fn unresolved_placeholders(value: &str) -> Result<Vec<String>, ConfigError> {
    let pattern = env_var_regex()?;
    Ok(pattern
        .captures_iter(value)
        .map(|cap| cap[1].to_string())
        .collect())
}
