//! Provider error types and handling

use std::time::Duration;
use thiserror::Error;

/// Result type for a single adapter call
pub type AdapterResult<T> = Result<T, ProviderError>;

/// A single provider call failed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Credential environment variable was not set at startup
    #[error("missing credentials: {env_var} is not set")]
    MissingCredentials { env_var: String },

    /// Provider is configured but has no working implementation
    #[error("provider '{provider}' is not implemented")]
    Unimplemented { provider: String },

    /// Adapter was handed input it cannot serve
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Provider rejected the credentials
    #[error("authentication failed ({status}): {message}")]
    Authentication { status: u16, message: String },

    /// Provider rejected the request as malformed
    #[error("bad request ({status}): {message}")]
    BadRequest { status: u16, message: String },

    /// Rate limit exceeded
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Provider returned a 5xx status
    #[error("server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Request timed out
    #[error("request timed out")]
    Timeout,

    /// Connection or transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Response body could not be decoded into the expected shape
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Response decoded but carried nothing usable
    #[error("empty response: {0}")]
    EmptyResponse(String),

    /// Caller deadline passed before the attempt could start
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl ProviderError {
    /// Whether repeating the same call could plausibly succeed.
    ///
    /// Configuration and request problems are permanent for the lifetime of
    /// the process, so the retry executor gives up on them at once and the
    /// router moves straight to the next adapter.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. }
            | Self::ServerError { .. }
            | Self::Timeout
            | Self::Network(_)
            | Self::Parse(_)
            | Self::EmptyResponse(_) => true,
            Self::MissingCredentials { .. }
            | Self::Unimplemented { .. }
            | Self::InvalidInput(_)
            | Self::Authentication { .. }
            | Self::BadRequest { .. }
            | Self::DeadlineExceeded => false,
        }
    }

    /// True for failures caused by local setup rather than a provider outage
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials { .. } | Self::Unimplemented { .. }
        )
    }

    /// Stable label for logs and reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredentials { .. } => "missing_credentials",
            Self::Unimplemented { .. } => "unimplemented",
            Self::InvalidInput(_) => "invalid_input",
            Self::Authentication { .. } => "authentication",
            Self::BadRequest { .. } => "bad_request",
            Self::RateLimited { .. } => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::Timeout => "timeout",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::EmptyResponse(_) => "empty_response",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_connect() {
            ProviderError::Network(format!("connection failed: {}", err))
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}
