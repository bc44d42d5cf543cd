//! HTTP client implementation using reqwest

use crate::config::ConnectionConfig;
use crate::http::error::map_http_error;
use crate::http::REQUEST_ID_HEADER;
use crate::providers::error::{AdapterResult, ProviderError};
use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use reqwest::multipart::Form;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Maximum response size (25MB, enough for a few minutes of synthesized audio)
const MAX_RESPONSE_SIZE: usize = 25 * 1024 * 1024;

/// Default user agent
const USER_AGENT: &str = concat!("prabhai/", env!("CARGO_PKG_VERSION"));

/// Binary response body with its declared content type
#[derive(Debug, Clone)]
pub struct BinaryBody {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

/// Shared HTTP client with connection pooling.
///
/// Cloning is cheap; every adapter holds a clone of the same pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    max_response_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client with default connection settings
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(&ConnectionConfig::default())
    }

    /// Create a new HTTP client from connection configuration
    pub fn with_config(config: &ConnectionConfig) -> Result<Self, reqwest::Error> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(config.keepalive_secs))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    /// POST a JSON body and decode a JSON response
    pub async fn post_json<B, T>(
        &self,
        provider: &str,
        url: &str,
        headers: HeaderMap,
        body: &B,
        request_id: Uuid,
    ) -> AdapterResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.post(url).headers(headers).json(body);
        let response = self.send(provider, url, request, request_id).await?;
        let bytes = self.read_body(provider, response, request_id).await?;
        decode_json(provider, &bytes, request_id)
    }

    /// POST a JSON body and return the raw response bytes (audio endpoints)
    pub async fn post_json_for_bytes<B>(
        &self,
        provider: &str,
        url: &str,
        headers: HeaderMap,
        body: &B,
        request_id: Uuid,
    ) -> AdapterResult<BinaryBody>
    where
        B: Serialize + ?Sized,
    {
        let request = self.client.post(url).headers(headers).json(body);
        let response = self.send(provider, url, request, request_id).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let data = self.read_body(provider, response, request_id).await?;

        Ok(BinaryBody { data, content_type })
    }

    /// POST a multipart form and decode a JSON response
    pub async fn post_multipart<T>(
        &self,
        provider: &str,
        url: &str,
        headers: HeaderMap,
        form: Form,
        request_id: Uuid,
    ) -> AdapterResult<T>
    where
        T: DeserializeOwned,
    {
        let request = self.client.post(url).headers(headers).multipart(form);
        let response = self.send(provider, url, request, request_id).await?;
        let bytes = self.read_body(provider, response, request_id).await?;
        decode_json(provider, &bytes, request_id)
    }

    /// Send the request and turn transport failures and non-2xx statuses into errors
    async fn send(
        &self,
        provider: &str,
        url: &str,
        request: RequestBuilder,
        request_id: Uuid,
    ) -> AdapterResult<Response> {
        debug!(provider, url, %request_id, "sending provider request");

        let response = request
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .send()
            .await
            .map_err(|e| {
                let error = ProviderError::from(e);
                warn!(provider, %request_id, error_kind = error.kind(), error = %error, "request failed");
                error
            })?;

        let status = response.status();
        debug!(provider, %request_id, status = status.as_u16(), "provider responded");

        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.ok();
        let error = map_http_error(status, retry_after.as_deref(), body);

        warn!(
            provider,
            %request_id,
            status = status.as_u16(),
            error_kind = error.kind(),
            "provider returned error status"
        );
        Err(error)
    }

    /// Read the body, refusing anything larger than the configured maximum
    async fn read_body(
        &self,
        provider: &str,
        response: Response,
        request_id: Uuid,
    ) -> AdapterResult<Vec<u8>> {
        if let Some(length) = response.content_length() {
            if length as usize > self.max_response_size {
                return Err(ProviderError::Parse(format!(
                    "response size {} exceeds maximum {} [request_id: {}]",
                    length, self.max_response_size, request_id
                )));
            }
        }

        let bytes = response.bytes().await.map_err(|e| {
            warn!(provider, %request_id, error = %e, "failed to read response body");
            ProviderError::Network(format!("failed to read response body: {}", e))
        })?;

        if bytes.len() > self.max_response_size {
            return Err(ProviderError::Parse(format!(
                "response size {} exceeds maximum {} [request_id: {}]",
                bytes.len(),
                self.max_response_size,
                request_id
            )));
        }

        Ok(bytes.to_vec())
    }
}

fn decode_json<T: DeserializeOwned>(
    provider: &str,
    bytes: &[u8],
    request_id: Uuid,
) -> AdapterResult<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        warn!(provider, %request_id, error = %e, "response did not match expected shape");
        ProviderError::Parse(format!("{} [request_id: {}]", e, request_id))
    })
}
