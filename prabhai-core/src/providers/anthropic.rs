//! Anthropic provider implementation
//!
//! Serves LLM and vision requests through the Messages API. Unlike OpenAI,
//! the system prompt is a top-level field, `max_tokens` is mandatory and
//! authentication uses `x-api-key` instead of a bearer token.

use crate::http::HttpClient;
use crate::protocol::{CallContext, Capability, CapabilityInput, ImageSource, Payload};
use crate::providers::adapter::{insert_header, unsupported_input, Endpoint, ProviderAdapter};
use crate::providers::error::{AdapterResult, ProviderError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

/// API version sent with every request
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// `max_tokens` used when the input does not set one
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageBlockSource },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ImageBlockSource {
    Base64 { media_type: String, data: String },
    Url { url: String },
}

#[derive(Debug, Clone, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

fn text_message(role: &'static str, text: &str) -> Message {
    Message {
        role,
        content: vec![ContentBlock::Text {
            text: text.to_string(),
        }],
    }
}

/// Claude adapter for one capability (LLM or vision)
#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    endpoint: Endpoint,
    http: HttpClient,
    capability: Capability,
}

impl AnthropicAdapter {
    /// Create an adapter; only `Llm` and `Vision` are accepted
    pub fn new(endpoint: Endpoint, http: HttpClient, capability: Capability) -> AdapterResult<Self> {
        if !matches!(capability, Capability::Llm | Capability::Vision) {
            return Err(ProviderError::InvalidInput(format!(
                "anthropic adapter '{}' cannot serve {}",
                endpoint.name, capability
            )));
        }
        Ok(Self {
            endpoint,
            http,
            capability,
        })
    }

    fn build_request(&self, input: &CapabilityInput, context: &CallContext) -> AdapterResult<MessagesRequest> {
        let system = context
            .persona
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(str::to_string);

        let (messages, temperature, max_tokens) = match input {
            CapabilityInput::Llm {
                prompt,
                history,
                temperature,
                max_tokens,
            } if self.capability == Capability::Llm => {
                let mut messages: Vec<Message> = history
                    .iter()
                    .map(|turn| text_message(turn.role.as_str(), &turn.content))
                    .collect();
                messages.push(text_message("user", prompt));
                (messages, *temperature, *max_tokens)
            }
            CapabilityInput::Vision { image, prompt } if self.capability == Capability::Vision => {
                let source = match image {
                    ImageSource::Url(url) => ImageBlockSource::Url { url: url.clone() },
                    ImageSource::Bytes { data, mime_type } => ImageBlockSource::Base64 {
                        media_type: mime_type.clone(),
                        data: STANDARD.encode(data),
                    },
                };
                let message = Message {
                    role: "user",
                    content: vec![
                        ContentBlock::Image { source },
                        ContentBlock::Text {
                            text: prompt.clone(),
                        },
                    ],
                };
                (vec![message], None, None)
            }
            other => return Err(unsupported_input(&self.endpoint.name, other)),
        };

        Ok(MessagesRequest {
            model: self.endpoint.model.clone(),
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            messages,
            temperature,
        })
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn name(&self) -> &str {
        &self.endpoint.name
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn call(&self, input: &CapabilityInput, context: &CallContext) -> AdapterResult<Payload> {
        let api_key = self.endpoint.api_key()?;
        let request = self.build_request(input, context)?;

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "x-api-key", api_key)?;
        insert_header(&mut headers, "anthropic-version", ANTHROPIC_VERSION)?;

        let response: MessagesResponse = self
            .http
            .post_json(
                self.name(),
                &self.endpoint.url("/messages"),
                headers,
                &request,
                context.request_id,
            )
            .await?;

        let text = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse(format!(
                "message had no text (stop_reason: {})",
                response.stop_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(Payload::Text { text })
    }
}
