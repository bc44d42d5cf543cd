//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use crate::protocol::Capability;
use crate::providers::retry::{RetryPolicy, RetryPolicyError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Schema version understood by this crate
pub const CONFIG_VERSION: &str = "0.1";

/// Root configuration structure for PrabhAI routing
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrabhaiConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Retry policy shared by every adapter
    #[serde(default)]
    pub retry: RetryConfig,

    /// HTTP connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Provider adapters available to the router
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    /// Preference order per capability
    #[serde(default)]
    pub routing: RoutingConfig,
}

/// Which wire protocol an adapter speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI and OpenAI-compatible APIs (Groq, OpenRouter, Together, ...)
    #[serde(rename = "openai")]
    OpenAi,
    /// Anthropic Messages API
    Anthropic,
    /// Placeholder for a provider that has no adapter yet
    Unimplemented,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Unimplemented => "unimplemented",
        }
    }

    /// Capabilities this kind has an adapter for
    pub fn supports(&self, capability: Capability) -> bool {
        match self {
            ProviderKind::OpenAi => true,
            ProviderKind::Anthropic => {
                matches!(capability, Capability::Llm | Capability::Vision)
            }
            ProviderKind::Unimplemented => true,
        }
    }

    fn default_base_url(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("https://api.openai.com/v1"),
            ProviderKind::Anthropic => Some("https://api.anthropic.com/v1"),
            ProviderKind::Unimplemented => None,
        }
    }

    fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Unimplemented => None,
        }
    }

    fn default_model(&self, capability: Capability) -> Option<&'static str> {
        match (self, capability) {
            (ProviderKind::OpenAi, Capability::Llm | Capability::Vision) => Some("gpt-4o-mini"),
            (ProviderKind::OpenAi, Capability::Tts) => Some("tts-1"),
            (ProviderKind::OpenAi, Capability::Stt) => Some("whisper-1"),
            (ProviderKind::Anthropic, Capability::Llm | Capability::Vision) => {
                Some("claude-3-5-haiku-latest")
            }
            _ => None,
        }
    }
}

/// One provider adapter: a concrete provider serving one capability
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Unique adapter name, used in routing lists and logs
    pub name: String,

    /// Wire protocol
    pub kind: ProviderKind,

    /// Capability this adapter serves
    pub capability: Capability,

    /// Base URL; defaults per kind
    #[serde(default)]
    pub base_url: Option<String>,

    /// Model identifier; defaults per kind and capability
    #[serde(default)]
    pub model: Option<String>,

    /// Environment variable holding the API key; defaults per kind
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Voice for text-to-speech adapters
    #[serde(default)]
    pub voice: Option<String>,

    /// Disabled adapters are skipped when the routing table is built
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ProviderConfig {
    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .or_else(|| self.kind.default_base_url())
    }

    pub fn model(&self) -> Option<&str> {
        self.model
            .as_deref()
            .or_else(|| self.kind.default_model(self.capability))
    }

    pub fn api_key_env(&self) -> Option<&str> {
        self.api_key_env
            .as_deref()
            .or_else(|| self.kind.default_api_key_env())
    }
}

/// Ordered adapter names per capability; `None` means not configured
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stt: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<Vec<String>>,
}

impl RoutingConfig {
    /// Configured preference list for a capability
    pub fn list(&self, capability: Capability) -> Option<&[String]> {
        match capability {
            Capability::Llm => self.llm.as_deref(),
            Capability::Tts => self.tts.as_deref(),
            Capability::Stt => self.stt.as_deref(),
            Capability::Vision => self.vision.as_deref(),
        }
    }

    /// Capabilities that have a list, in stable order
    pub fn configured(&self) -> impl Iterator<Item = (Capability, &[String])> {
        Capability::ALL
            .into_iter()
            .filter_map(move |c| self.list(c).map(|names| (c, names)))
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Attempts per adapter, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Build the runtime policy
    pub fn to_policy(&self) -> Result<RetryPolicy, ValidationError> {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
            self.backoff_multiplier,
        )
        .map_err(|e| match e {
            RetryPolicyError::ZeroAttempts => {
                ValidationError::out_of_range("retry.max_attempts", "must be at least 1")
            }
            RetryPolicyError::InvalidMultiplier(_) => ValidationError::out_of_range(
                "retry.backoff_multiplier",
                "must be greater than 1.0",
            ),
        })
    }
}

/// Connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Maximum idle connections per host
    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,

    /// Keep-alive timeout in seconds
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_idle_per_host: default_max_idle(),
            keepalive_secs: default_keepalive(),
        }
    }
}

// Default value functions for serde
fn default_true() -> bool { true }
fn default_max_attempts() -> u32 { 3 }
fn default_initial_delay() -> u64 { 1000 }
fn default_backoff_multiplier() -> f64 { 2.0 }
fn default_connect_timeout() -> u64 { 10000 }
fn default_request_timeout() -> u64 { 60000 }
fn default_max_idle() -> usize { 10 }
fn default_keepalive() -> u64 { 90 }

impl PrabhaiConfig {
    /// Validate the configuration structure
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }

        if self.version != CONFIG_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::InvalidVersion {
                    expected: CONFIG_VERSION.to_string(),
                    actual: self.version.clone(),
                },
            ));
        }

        self.retry.to_policy()?;
        self.connection.validate("connection")?;

        if self.providers.is_empty() {
            return Err(ValidationError::required("providers")
                .with_context("at least one provider must be configured"));
        }

        let mut seen_names = HashSet::new();
        for (i, provider) in self.providers.iter().enumerate() {
            if !seen_names.insert(provider.name.as_str()) {
                return Err(ValidationError::new(
                    format!("providers[{}].name", i),
                    ValidationErrorKind::DuplicateValue {
                        value: provider.name.clone(),
                    },
                ));
            }

            provider.validate(&format!("providers[{}]", i))?;
        }

        Ok(())
    }

    /// Look up a provider by name
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }
}

impl ProviderConfig {
    /// Validate provider configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.name", path)));
        }

        if !self.kind.supports(self.capability) {
            return Err(ValidationError::incompatible(
                format!("{}.capability", path),
                format!(
                    "{} providers do not support {}",
                    self.kind.as_str(),
                    self.capability
                ),
            ));
        }

        // Placeholders have no endpoint; they fail at call time.
        if self.kind == ProviderKind::Unimplemented {
            return Ok(());
        }

        let base_url = self
            .base_url()
            .ok_or_else(|| ValidationError::required(format!("{}.base_url", path)))?;
        validate_http_url(&format!("{}.base_url", path), base_url)?;

        if self.model().is_none() {
            return Err(ValidationError::required(format!("{}.model", path)));
        }

        if let Some(voice) = &self.voice {
            if self.capability != Capability::Tts {
                return Err(ValidationError::incompatible(
                    format!("{}.voice", path),
                    "Only text-to-speech providers take a voice",
                ));
            }
            if voice.trim().is_empty() {
                return Err(ValidationError::required(format!("{}.voice", path)));
            }
        }

        Ok(())
    }
}

impl ConnectionConfig {
    /// Validate connection configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.connect_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.connect_timeout_ms", path),
                "must be greater than 0",
            ));
        }

        if self.request_timeout_ms < self.connect_timeout_ms {
            return Err(ValidationError::incompatible(
                format!("{}.request_timeout_ms", path),
                "must be at least connect_timeout_ms",
            ));
        }

        Ok(())
    }
}

fn validate_http_url(path: &str, value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        Ok(url) => Err(ValidationError::new(
            path,
            ValidationErrorKind::InvalidUrl {
                message: format!("URL scheme must be http or https, got: {}", url.scheme()),
            },
        )),
        Err(e) => Err(ValidationError::new(
            path,
            ValidationErrorKind::InvalidUrl {
                message: e.to_string(),
            },
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str, kind: ProviderKind, capability: Capability) -> ProviderConfig {
        ProviderConfig {
            name: name.to_string(),
            kind,
            capability,
            base_url: None,
            model: None,
            api_key_env: None,
            voice: None,
            enabled: true,
        }
    }

    #[test]
    fn test_kind_defaults() {
        let p = provider("openai-tts", ProviderKind::OpenAi, Capability::Tts);
        assert_eq!(p.base_url(), Some("https://api.openai.com/v1"));
        assert_eq!(p.model(), Some("tts-1"));
        assert_eq!(p.api_key_env(), Some("OPENAI_API_KEY"));

        let p = provider("claude", ProviderKind::Anthropic, Capability::Llm);
        assert_eq!(p.api_key_env(), Some("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_anthropic_rejects_speech() {
        let p = provider("claude-tts", ProviderKind::Anthropic, Capability::Tts);
        let err = p.validate("providers[0]").unwrap_err();
        assert_eq!(err.field_path, "providers[0].capability");
    }

    #[test]
    fn test_voice_only_for_tts() {
        let mut p = provider("gpt", ProviderKind::OpenAi, Capability::Llm);
        p.voice = Some("alloy".into());
        assert_eq!(
            p.validate("providers[0]").unwrap_err().field_path,
            "providers[0].voice"
        );
    }

    #[test]
    fn test_bad_base_url() {
        let mut p = provider("gpt", ProviderKind::OpenAi, Capability::Llm);
        p.base_url = Some("ftp://example.com".into());
        let err = p.validate("providers[0]").unwrap_err();
        assert!(matches!(err.kind, ValidationErrorKind::InvalidUrl { .. }));
    }

    #[test]
    fn test_retry_config_to_policy() {
        let config = RetryConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(
            config.to_policy().unwrap_err().field_path,
            "retry.max_attempts"
        );

        let policy = RetryConfig::default().to_policy().unwrap();
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn test_routing_configured_order() {
        let routing = RoutingConfig {
            llm: Some(vec!["a".into()]),
            tts: None,
            stt: Some(vec![]),
            vision: None,
        };
        let configured: Vec<_> = routing.configured().map(|(c, _)| c).collect();
        assert_eq!(configured, vec![Capability::Llm, Capability::Stt]);
    }
}
