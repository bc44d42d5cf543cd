//! Provider adapter trait and shared adapter plumbing
//!
//! An adapter turns the uniform `CapabilityInput` + `CallContext` into one
//! provider's wire format, performs the call, and normalizes the answer into
//! a `Payload`. Every failure is reported as an `Err`; an adapter never
//! returns an empty success.

use crate::config::SecretString;
use crate::protocol::{CallContext, Capability, CapabilityInput, Payload};
use crate::providers::error::{AdapterResult, ProviderError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};

/// Core trait that every provider adapter implements
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Unique adapter name, reported in results and logs
    fn name(&self) -> &str;

    /// The capability this adapter serves
    fn capability(&self) -> Capability;

    /// Perform one call against the provider
    async fn call(&self, input: &CapabilityInput, context: &CallContext) -> AdapterResult<Payload>;
}

/// Connection details shared by HTTP-backed adapters
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Adapter name
    pub name: String,

    /// Base URL without trailing slash
    pub base_url: String,

    /// Model identifier sent to the provider
    pub model: String,

    /// Variable the credential was read from, for error reporting
    pub api_key_env: String,

    api_key: Option<SecretString>,
}

impl Endpoint {
    /// Create an endpoint, reading the credential from `api_key_env` once
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key_env: impl Into<String>,
    ) -> Self {
        let api_key_env = api_key_env.into();
        let api_key = SecretString::from_env(&api_key_env);
        let base_url: String = base_url.into();

        Self {
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key_env,
            api_key,
        }
    }

    /// Use an explicit credential instead of the environment
    pub fn with_api_key(mut self, api_key: impl Into<SecretString>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Drop any credential, as if the variable were unset
    pub fn without_api_key(mut self) -> Self {
        self.api_key = None;
        self
    }

    /// Redacted view of the credential for logs
    pub fn credential_hint(&self) -> String {
        self.api_key
            .as_ref()
            .map(SecretString::partial_redact)
            .unwrap_or_else(|| format!("<{} unset>", self.api_key_env))
    }

    /// Full URL for an API path such as `/chat/completions`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The credential, or `MissingCredentials` when none was configured
    pub fn api_key(&self) -> AdapterResult<&str> {
        self.api_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .map(SecretString::expose_secret)
            .ok_or_else(|| ProviderError::MissingCredentials {
                env_var: self.api_key_env.clone(),
            })
    }
}

/// `Authorization: Bearer <key>` headers
pub fn bearer_headers(api_key: &str) -> AdapterResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, header_value(AUTHORIZATION.as_str(), &format!("Bearer {}", api_key))?);
    Ok(headers)
}

/// Insert a header whose value comes from configuration
pub fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> AdapterResult<()> {
    headers.insert(HeaderName::from_static(name), header_value(name, value)?);
    Ok(())
}

fn header_value(name: &str, value: &str) -> AdapterResult<HeaderValue> {
    let mut header = HeaderValue::from_str(value).map_err(|_| {
        ProviderError::InvalidInput(format!(
            "value for header '{}' contains characters not allowed in a header",
            name
        ))
    })?;
    header.set_sensitive(true);
    Ok(header)
}

/// Error for an input variant the adapter does not serve
pub fn unsupported_input(adapter: &str, input: &CapabilityInput) -> ProviderError {
    ProviderError::InvalidInput(format!(
        "adapter '{}' cannot handle {} input",
        adapter,
        input.capability()
    ))
}

/// Adapter for a provider that is configured but not built yet.
///
/// Always fails with `Unimplemented`, which monitoring can tell apart from a
/// provider outage and which the retry executor never repeats.
#[derive(Debug, Clone)]
pub struct UnimplementedAdapter {
    name: String,
    capability: Capability,
}

impl UnimplementedAdapter {
    pub fn new(name: impl Into<String>, capability: Capability) -> Self {
        Self {
            name: name.into(),
            capability,
        }
    }
}

#[async_trait]
impl ProviderAdapter for UnimplementedAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn call(&self, _input: &CapabilityInput, _context: &CallContext) -> AdapterResult<Payload> {
        Err(ProviderError::Unimplemented {
            provider: self.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_and_missing_key() {
        let endpoint = Endpoint::new(
            "groq",
            "https://api.groq.com/openai/v1/",
            "llama-3.1-8b-instant",
            "PRABHAI_TEST_UNSET_GROQ_KEY",
        );
        assert_eq!(
            endpoint.url("/chat/completions"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(
            endpoint.api_key(),
            Err(ProviderError::MissingCredentials {
                env_var: "PRABHAI_TEST_UNSET_GROQ_KEY".into()
            })
        );

        assert_eq!(endpoint.credential_hint(), "<PRABHAI_TEST_UNSET_GROQ_KEY unset>");

        let endpoint = endpoint.with_api_key("gsk-test");
        assert_eq!(endpoint.api_key(), Ok("gsk-test"));
        assert!(endpoint.without_api_key().api_key().is_err());
    }

    #[test]
    fn test_bearer_headers_are_sensitive() {
        let headers = bearer_headers("sk-test").unwrap();
        let value = headers.get(AUTHORIZATION).unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer sk-test");
        assert!(value.is_sensitive());

        assert_eq!(
            bearer_headers("bad\nkey").unwrap_err(),
            ProviderError::InvalidInput(
                "value for header 'authorization' contains characters not allowed in a header"
                    .into()
            )
        );
    }

    #[test]
    fn test_insert_header_error_names_the_header() {
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "anthropic-version", "2023-06-01").unwrap();
        assert_eq!(headers.get("anthropic-version").unwrap(), "2023-06-01");

        let err = insert_header(&mut headers, "anthropic-version", "2023\r\n06").unwrap_err();
        let ProviderError::InvalidInput(message) = err else {
            panic!("expected InvalidInput, got {:?}", err);
        };
        assert!(message.contains("'anthropic-version'"));
        assert!(!message.contains("credential"));
    }

    #[tokio::test]
    async fn test_unimplemented_adapter_fails_distinctly() {
        let adapter = UnimplementedAdapter::new("gemini-tts", Capability::Tts);
        let err = adapter
            .call(&CapabilityInput::tts("hello"), &CallContext::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProviderError::Unimplemented {
                provider: "gemini-tts".into()
            }
        );
        assert!(!err.is_retryable());
    }
}
