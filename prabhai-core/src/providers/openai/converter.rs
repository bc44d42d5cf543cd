//! Conversion between capability inputs and OpenAI wire types

use super::types::{
    OpenAIChatRequest, OpenAIChatResponse, OpenAIContent, OpenAIContentPart, OpenAIImageUrl,
    OpenAIMessage,
};
use crate::protocol::{CallContext, CapabilityInput, ImageSource, Payload};
use crate::providers::adapter::unsupported_input;
use crate::providers::error::{AdapterResult, ProviderError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Build a chat completions request for an LLM or vision input
pub fn to_chat_request(
    adapter: &str,
    model: &str,
    input: &CapabilityInput,
    context: &CallContext,
) -> AdapterResult<OpenAIChatRequest> {
    let mut messages = Vec::new();
    if let Some(persona) = context.persona.as_deref().filter(|p| !p.trim().is_empty()) {
        messages.push(OpenAIMessage {
            role: "system",
            content: OpenAIContent::Text(persona.to_string()),
        });
    }

    let (temperature, max_tokens) = match input {
        CapabilityInput::Llm {
            prompt,
            history,
            temperature,
            max_tokens,
        } => {
            messages.extend(history.iter().map(|turn| OpenAIMessage {
                role: turn.role.as_str(),
                content: OpenAIContent::Text(turn.content.clone()),
            }));
            messages.push(OpenAIMessage {
                role: "user",
                content: OpenAIContent::Text(prompt.clone()),
            });
            (*temperature, *max_tokens)
        }
        CapabilityInput::Vision { image, prompt } => {
            messages.push(OpenAIMessage {
                role: "user",
                content: OpenAIContent::Parts(vec![
                    OpenAIContentPart::Text {
                        text: prompt.clone(),
                    },
                    OpenAIContentPart::ImageUrl {
                        image_url: OpenAIImageUrl {
                            url: image_url(image),
                        },
                    },
                ]),
            });
            (None, None)
        }
        other => return Err(unsupported_input(adapter, other)),
    };

    Ok(OpenAIChatRequest {
        model: model.to_string(),
        messages,
        temperature,
        max_tokens,
    })
}

/// URL form of an image: remote URLs pass through, bytes become a data URL
pub fn image_url(image: &ImageSource) -> String {
    match image {
        ImageSource::Url(url) => url.clone(),
        ImageSource::Bytes { data, mime_type } => {
            format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
        }
    }
}

/// Extract the first choice's text, failing on empty or refused completions
pub fn from_chat_response(response: OpenAIChatResponse) -> AdapterResult<Payload> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::EmptyResponse("no choices returned".into()))?;

    if let Some(refusal) = choice.message.refusal.filter(|r| !r.trim().is_empty()) {
        return Err(ProviderError::EmptyResponse(format!("model refused: {}", refusal)));
    }

    match choice.message.content {
        Some(text) if !text.trim().is_empty() => Ok(Payload::Text { text }),
        _ => Err(ProviderError::EmptyResponse(format!(
            "completion had no text (finish_reason: {})",
            choice.finish_reason.as_deref().unwrap_or("unknown")
        ))),
    }
}

/// MIME type for synthesized audio, defaulting to MP3
pub fn speech_mime_type(content_type: Option<&str>) -> String {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| ct.starts_with("audio/"))
        .unwrap_or("audio/mpeg")
        .to_string()
}

/// File name for a transcription upload; the API infers the format from it
pub fn audio_file_name(mime_type: &str) -> &'static str {
    match mime_type.split(';').next().map(str::trim) {
        Some("audio/webm") => "audio.webm",
        Some("audio/wav") | Some("audio/x-wav") | Some("audio/wave") => "audio.wav",
        Some("audio/ogg") => "audio.ogg",
        Some("audio/mp4") | Some("audio/m4a") | Some("audio/x-m4a") => "audio.m4a",
        Some("audio/flac") => "audio.flac",
        _ => "audio.mp3",
    }
}
