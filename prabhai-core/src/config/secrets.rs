//! Credential handling with redaction
//!
//! API keys are read from the environment once, when adapters are built,
//! and never appear in `Debug` or `Display` output.

use std::env;
use std::fmt;

/// A wrapper type for sensitive strings like API keys
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new secret string
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Read a secret from the environment; unset or blank variables yield `None`
    pub fn from_env(var: &str) -> Option<Self> {
        env::var(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(Self::new)
    }

    /// Get the actual value (use with caution)
    pub fn expose_secret(&self) -> &str {
        &self.value
    }

    /// Check if the secret is empty
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Get a partially redacted version for debugging
    pub fn partial_redact(&self) -> String {
        let len = self.value.len();
        if len == 0 {
            return "[EMPTY]".to_string();
        }
        if len <= 8 || !self.value.is_ascii() {
            return "[REDACTED]".to_string();
        }

        let prefix = if self.value.starts_with("sk-") { 3 } else { 2 };
        format!("{}...{}", &self.value[..prefix], &self.value[len - 4..])
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
