//! HTTP error mapping utilities

use crate::providers::error::ProviderError;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Longest error text kept from a provider response body
const MAX_ERROR_MESSAGE_LEN: usize = 512;

/// Map a non-success HTTP status and response body to a `ProviderError`
pub fn map_http_error(
    status: StatusCode,
    retry_after_header: Option<&str>,
    body: Option<String>,
) -> ProviderError {
    let message = body
        .as_deref()
        .and_then(extract_error_message)
        .or(body.clone())
        .filter(|m| !m.trim().is_empty())
        .map(|m| truncate(&m))
        .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));

    let code = status.as_u16();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication {
            status: code,
            message,
        },

        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            message,
            retry_after: retry_after_header.and_then(parse_retry_after),
        },

        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderError::Timeout,

        status if status.is_server_error() => ProviderError::ServerError {
            status: code,
            message,
        },

        status if status.is_client_error() => ProviderError::BadRequest {
            status: code,
            message,
        },

        // 1xx/3xx reaching here means redirects were exhausted or the
        // provider spoke an unexpected protocol; treat as transport trouble.
        _ => ProviderError::Network(format!("unexpected HTTP status {}: {}", code, message)),
    }
}

/// Pull a human-readable message out of common JSON error bodies
fn extract_error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;

    // OpenAI and Anthropic: { "error": { "message": "..." } }
    if let Some(message) = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
    {
        return Some(message.to_string());
    }

    // Generic: { "message": "..." } or { "error": "..." } or { "detail": "..." }
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn truncate(message: &str) -> String {
    if message.len() <= MAX_ERROR_MESSAGE_LEN {
        return message.to_string();
    }
    let mut end = MAX_ERROR_MESSAGE_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &message[..end])
}

/// Parse a Retry-After header value given in seconds
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    // HTTP-date values are not used by the providers we call.
    header_value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
