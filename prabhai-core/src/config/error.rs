//! Errors raised while loading and checking a routing config

use std::fmt;
use thiserror::Error;

/// Why a config file could not be turned into a usable `PrabhaiConfig`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config '{path}'{}: {message}", location(.line, .column))]
    ParseError {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("invalid config: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("config references unset environment variable '{var}'")]
    EnvVarNotFound { var: String },

    #[error("'{path}' is not a config file; use .yaml, .yml or .json")]
    UnsupportedFormat { path: String },

    #[error("env interpolation unavailable: {message}")]
    Interpolation { message: String },
}

fn location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" at {}:{}", line, column),
        (Some(line), None) => format!(" at line {}", line),
        _ => String::new(),
    }
}

/// A rejected config value and where it sits, e.g. `routing.llm[1]`
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ValidationError {
    pub field_path: String,
    pub kind: ValidationErrorKind,
    /// Hint appended to the message
    pub context: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_path, self.kind)?;
        if let Some(hint) = &self.context {
            write!(f, " ({})", hint)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationErrorKind {
    #[error("missing")]
    RequiredFieldMissing,

    #[error("expected {expected}, got {actual}")]
    InvalidValue { expected: String, actual: String },

    #[error("out of range, {message}")]
    OutOfRange { message: String },

    #[error("{message}")]
    InvalidFormat { message: String },

    #[error("'{value}' appears more than once")]
    DuplicateValue { value: String },

    #[error("no provider named '{name}'")]
    UnknownReference { name: String },

    #[error("{message}")]
    Incompatible { message: String },

    #[error("bad URL, {message}")]
    InvalidUrl { message: String },

    #[error("unsupported config version '{actual}', this build reads '{expected}'")]
    InvalidVersion { expected: String, actual: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            context: None,
        }
    }

    pub fn with_context(mut self, hint: impl Into<String>) -> Self {
        self.context = Some(hint.into());
        self
    }

    pub fn required(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::RequiredFieldMissing)
    }

    pub fn out_of_range(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::OutOfRange {
                message: message.into(),
            },
        )
    }

    pub fn invalid_format(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::InvalidFormat {
                message: message.into(),
            },
        )
    }

    pub fn incompatible(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::Incompatible {
                message: message.into(),
            },
        )
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_location_is_optional() {
        let located = ConfigError::ParseError {
            path: "prabhai.json".into(),
            line: Some(3),
            column: Some(14),
            message: "expected `,`".into(),
        };
        assert_eq!(
            located.to_string(),
            "cannot parse config 'prabhai.json' at 3:14: expected `,`"
        );

        let unlocated = ConfigError::ParseError {
            path: "<inline>".into(),
            line: None,
            column: None,
            message: "EOF while parsing".into(),
        };
        assert_eq!(
            unlocated.to_string(),
            "cannot parse config '<inline>': EOF while parsing"
        );
    }

    #[test]
    fn test_validation_error_names_the_field() {
        let err = ValidationError::new(
            "routing.llm[1]",
            ValidationErrorKind::UnknownReference {
                name: "mistral".into(),
            },
        )
        .with_context("routing lists may only name configured providers");

        assert_eq!(
            ConfigError::from(err).to_string(),
            "invalid config: routing.llm[1]: no provider named 'mistral' \
             (routing lists may only name configured providers)"
        );
    }
}
