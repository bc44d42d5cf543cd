//! HTTP client module for making API requests to AI providers
//!
//! This module implements the HTTP layer shared by every adapter, handling:
//! - Connection pooling and client management
//! - Error mapping from status codes and error bodies
//! - Request ID propagation for correlation

pub mod client;
pub mod error;

pub use client::{BinaryBody, HttpClient};
pub use error::{map_http_error, parse_retry_after};

/// Header carrying the caller's request id to the provider
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
