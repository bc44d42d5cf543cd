//! OpenAI wire types
//!
//! Only the fields the adapters send or read are modeled; unknown response
//! fields are ignored.

use serde::{Deserialize, Serialize};

/// Chat completions request body
#[derive(Debug, Clone, Serialize)]
pub struct OpenAIChatRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAIMessage {
    pub role: &'static str,
    pub content: OpenAIContent,
}

/// Plain text or multimodal content parts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OpenAIContent {
    Text(String),
    Parts(Vec<OpenAIContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpenAIContentPart {
    Text { text: String },
    ImageUrl { image_url: OpenAIImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAIImageUrl {
    /// `https://...` or `data:<mime>;base64,<data>`
    pub url: String,
}

/// Chat completions response body
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChatResponse {
    #[serde(default)]
    pub choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub refusal: Option<String>,
}

/// `/audio/speech` request body
#[derive(Debug, Clone, Serialize)]
pub struct OpenAISpeechRequest {
    pub model: String,
    pub input: String,
    pub voice: String,
    pub response_format: &'static str,
}

/// `/audio/transcriptions` JSON response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAITranscription {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}
