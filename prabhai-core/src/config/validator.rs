//! Configuration validation utilities
//!
//! `PrabhaiConfig::validate` checks each section on its own; the validator
//! here checks how sections refer to each other and warns about setups that
//! are legal but probably unintended.

use super::env::unresolved_placeholders;
use super::error::{ConfigError, ValidationError, ValidationErrorKind};
use super::schema::{PrabhaiConfig, ProviderKind};
use super::secrets::SecretString;
use std::collections::HashSet;
use tracing::warn;

/// Configuration validator with cross-reference rules
#[derive(Debug, Default)]
pub struct ConfigValidator {
    /// Skip the warning for credentials missing from the environment
    quiet_credentials: bool,
}

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not warn about unset credential variables
    pub fn quiet_credentials(mut self) -> Self {
        self.quiet_credentials = true;
        self
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &PrabhaiConfig) -> Result<(), ConfigError> {
        config.validate()?;

        self.validate_api_key_envs(config)?;
        self.validate_placeholders(config)?;
        self.validate_routing(config)?;
        self.warn_unrouted(config);

        Ok(())
    }

    /// Credential variable names must be valid environment variable names
    fn validate_api_key_envs(&self, config: &PrabhaiConfig) -> Result<(), ValidationError> {
        for (i, provider) in config.providers.iter().enumerate() {
            let Some(var) = provider.api_key_env() else {
                continue;
            };

            if !is_env_var_name(var) {
                return Err(ValidationError::invalid_format(
                    format!("providers[{}].api_key_env", i),
                    format!("'{}' is not a valid environment variable name", var),
                ));
            }

            let needs_key = provider.enabled && provider.kind != ProviderKind::Unimplemented;
            if needs_key && !self.quiet_credentials && SecretString::from_env(var).is_none() {
                warn!(
                    provider = provider.name.as_str(),
                    env_var = var,
                    "credential variable is not set; calls to this provider will fail"
                );
            }
        }

        Ok(())
    }

    /// Catch `${VAR}` text that survived loading, e.g. in configs built in code
    fn validate_placeholders(&self, config: &PrabhaiConfig) -> Result<(), ConfigError> {
        for (i, provider) in config.providers.iter().enumerate() {
            let fields = [
                ("base_url", provider.base_url.as_deref()),
                ("model", provider.model.as_deref()),
                ("voice", provider.voice.as_deref()),
            ];

            for (field, value) in fields {
                let Some(value) = value else { continue };
                if let Some(var) = unresolved_placeholders(value)?.into_iter().next() {
                    return Err(ValidationError::invalid_format(
                        format!("providers[{}].{}", i, field),
                        format!("unresolved placeholder ${{{}}}", var),
                    )
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Routing lists must name existing, matching, enabled providers
    fn validate_routing(&self, config: &PrabhaiConfig) -> Result<(), ValidationError> {
        let mut any_configured = false;

        for (capability, names) in config.routing.configured() {
            any_configured = true;
            let path = format!("routing.{}", capability);

            if names.is_empty() {
                return Err(ValidationError::required(path.as_str())
                    .with_context("a routing list must name at least one provider"));
            }

            let mut seen = HashSet::new();
            let mut enabled = 0;
            for (i, name) in names.iter().enumerate() {
                let entry_path = format!("{}[{}]", path, i);

                if !seen.insert(name.as_str()) {
                    return Err(ValidationError::new(
                        entry_path,
                        ValidationErrorKind::DuplicateValue {
                            value: name.clone(),
                        },
                    ));
                }

                let provider = config.provider(name).ok_or_else(|| {
                    ValidationError::new(
                        entry_path.as_str(),
                        ValidationErrorKind::UnknownReference { name: name.clone() },
                    )
                })?;

                if provider.capability != capability {
                    return Err(ValidationError::new(
                        entry_path,
                        ValidationErrorKind::InvalidValue {
                            expected: format!("a {} provider", capability),
                            actual: format!("'{}' serves {}", name, provider.capability),
                        },
                    ));
                }

                if provider.enabled {
                    enabled += 1;
                }
            }

            if enabled == 0 {
                return Err(ValidationError::incompatible(
                    path,
                    "Every provider in this list is disabled",
                ));
            }
        }

        if !any_configured {
            return Err(ValidationError::required("routing")
                .with_context("at least one capability must have a routing list"));
        }

        Ok(())
    }

    fn warn_unrouted(&self, config: &PrabhaiConfig) {
        for provider in &config.providers {
            let routed = config
                .routing
                .list(provider.capability)
                .is_some_and(|names| names.iter().any(|n| n == &provider.name));

            if !routed {
                warn!(
                    provider = provider.name.as_str(),
                    capability = provider.capability.as_str(),
                    "provider is configured but not in any routing list"
                );
            }
        }
    }
}

fn is_env_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase() || c == '_')
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
