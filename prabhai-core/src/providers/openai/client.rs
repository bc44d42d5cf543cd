//! OpenAI adapters for chat, vision, speech synthesis and transcription
//!
//! All four speak the OpenAI REST API, so any OpenAI-compatible endpoint
//! (Groq, OpenRouter, Together, a local server) works by changing the
//! endpoint's base URL.

use super::converter::{
    audio_file_name, from_chat_response, speech_mime_type, to_chat_request,
};
use super::types::{OpenAIChatResponse, OpenAISpeechRequest, OpenAITranscription};
use crate::http::HttpClient;
use crate::protocol::{CallContext, Capability, CapabilityInput, Payload};
use crate::providers::adapter::{bearer_headers, unsupported_input, Endpoint, ProviderAdapter};
use crate::providers::error::{AdapterResult, ProviderError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::debug;

/// Voice used when neither the request nor the config names one
pub const DEFAULT_VOICE: &str = "alloy";

/// Text generation through `/chat/completions`
#[derive(Debug, Clone)]
pub struct OpenAIChatAdapter {
    endpoint: Endpoint,
    http: HttpClient,
}

impl OpenAIChatAdapter {
    pub fn new(endpoint: Endpoint, http: HttpClient) -> Self {
        Self { endpoint, http }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAIChatAdapter {
    fn name(&self) -> &str {
        &self.endpoint.name
    }

    fn capability(&self) -> Capability {
        Capability::Llm
    }

    async fn call(&self, input: &CapabilityInput, context: &CallContext) -> AdapterResult<Payload> {
        if input.capability() != Capability::Llm {
            return Err(unsupported_input(self.name(), input));
        }
        chat_completion(&self.endpoint, &self.http, input, context).await
    }
}

/// Image questions through `/chat/completions` with an `image_url` part
#[derive(Debug, Clone)]
pub struct OpenAIVisionAdapter {
    endpoint: Endpoint,
    http: HttpClient,
}

impl OpenAIVisionAdapter {
    pub fn new(endpoint: Endpoint, http: HttpClient) -> Self {
        Self { endpoint, http }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAIVisionAdapter {
    fn name(&self) -> &str {
        &self.endpoint.name
    }

    fn capability(&self) -> Capability {
        Capability::Vision
    }

    async fn call(&self, input: &CapabilityInput, context: &CallContext) -> AdapterResult<Payload> {
        if input.capability() != Capability::Vision {
            return Err(unsupported_input(self.name(), input));
        }
        chat_completion(&self.endpoint, &self.http, input, context).await
    }
}

async fn chat_completion(
    endpoint: &Endpoint,
    http: &HttpClient,
    input: &CapabilityInput,
    context: &CallContext,
) -> AdapterResult<Payload> {
    let api_key = endpoint.api_key()?;
    let request = to_chat_request(&endpoint.name, &endpoint.model, input, context)?;

    let response: OpenAIChatResponse = http
        .post_json(
            &endpoint.name,
            &endpoint.url("/chat/completions"),
            bearer_headers(api_key)?,
            &request,
            context.request_id,
        )
        .await?;

    from_chat_response(response)
}

/// Speech synthesis through `/audio/speech`
#[derive(Debug, Clone)]
pub struct OpenAISpeechAdapter {
    endpoint: Endpoint,
    http: HttpClient,
    voice: String,
}

impl OpenAISpeechAdapter {
    pub fn new(endpoint: Endpoint, http: HttpClient, voice: Option<String>) -> Self {
        Self {
            endpoint,
            http,
            voice: voice.unwrap_or_else(|| DEFAULT_VOICE.to_string()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAISpeechAdapter {
    fn name(&self) -> &str {
        &self.endpoint.name
    }

    fn capability(&self) -> Capability {
        Capability::Tts
    }

    async fn call(&self, input: &CapabilityInput, context: &CallContext) -> AdapterResult<Payload> {
        let CapabilityInput::Tts { text, voice } = input else {
            return Err(unsupported_input(self.name(), input));
        };

        let api_key = self.endpoint.api_key()?;
        let request = OpenAISpeechRequest {
            model: self.endpoint.model.clone(),
            input: text.clone(),
            voice: voice.clone().unwrap_or_else(|| self.voice.clone()),
            response_format: "mp3",
        };

        let body = self
            .http
            .post_json_for_bytes(
                self.name(),
                &self.endpoint.url("/audio/speech"),
                bearer_headers(api_key)?,
                &request,
                context.request_id,
            )
            .await?;

        if body.data.is_empty() {
            return Err(ProviderError::EmptyResponse("no audio returned".into()));
        }

        debug!(provider = self.name(), bytes = body.data.len(), "speech synthesized");
        Ok(Payload::Audio {
            mime_type: speech_mime_type(body.content_type.as_deref()),
            data: body.data,
        })
    }
}

/// Transcription through multipart `/audio/transcriptions`
#[derive(Debug, Clone)]
pub struct OpenAITranscriptionAdapter {
    endpoint: Endpoint,
    http: HttpClient,
}

impl OpenAITranscriptionAdapter {
    pub fn new(endpoint: Endpoint, http: HttpClient) -> Self {
        Self { endpoint, http }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAITranscriptionAdapter {
    fn name(&self) -> &str {
        &self.endpoint.name
    }

    fn capability(&self) -> Capability {
        Capability::Stt
    }

    async fn call(&self, input: &CapabilityInput, context: &CallContext) -> AdapterResult<Payload> {
        let CapabilityInput::Stt {
            audio,
            mime_type,
            language,
        } = input
        else {
            return Err(unsupported_input(self.name(), input));
        };

        let api_key = self.endpoint.api_key()?;

        // A form is consumed by sending, so each attempt builds its own.
        let file = Part::bytes(audio.clone())
            .file_name(audio_file_name(mime_type))
            .mime_str(mime_type)
            .map_err(|e| ProviderError::InvalidInput(format!("bad audio MIME type: {}", e)))?;
        let mut form = Form::new()
            .part("file", file)
            .text("model", self.endpoint.model.clone())
            .text("response_format", "json");
        if let Some(language) = language {
            form = form.text("language", language.clone());
        }

        let transcription: OpenAITranscription = self
            .http
            .post_multipart(
                self.name(),
                &self.endpoint.url("/audio/transcriptions"),
                bearer_headers(api_key)?,
                form,
                context.request_id,
            )
            .await?;

        if transcription.text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse("no speech recognized".into()));
        }

        Ok(Payload::Transcript {
            text: transcription.text,
            language: transcription.language.or_else(|| language.clone()),
        })
    }
}
