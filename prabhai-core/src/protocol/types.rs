//! Core request and result types for capability routing
//!
//! These types form the uniform contract between callers, the router and
//! provider adapters:
//! - `Capability` names the kind of AI task being routed
//! - `CapabilityInput` is a discriminated union, one variant per capability
//! - `Payload` is the normalized success shape every adapter produces
//! - `CallContext` is caller metadata passed through to adapters unchanged
//! - `ProviderResult` is what the router hands back to the caller

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

/// Message shown to end users when no provider could serve a request
pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "The service is temporarily unavailable. Please try again in a moment.";

/// Provider name reported on failures produced by the router itself
pub const ROUTER_PROVIDER_NAME: &str = "Router";

/// Category of AI task the router can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// LLM text generation
    Llm,
    /// Text-to-speech
    Tts,
    /// Speech-to-text
    Stt,
    /// Image analysis
    Vision,
}

impl Capability {
    /// All capabilities, in a stable order
    pub const ALL: [Capability; 4] = [
        Capability::Llm,
        Capability::Tts,
        Capability::Stt,
        Capability::Vision,
    ];

    /// Stable lowercase name used in configuration and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Llm => "llm",
            Capability::Tts => "tts",
            Capability::Stt => "stt",
            Capability::Vision => "vision",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speaker of a prior turn in an LLM conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// A prior turn of conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Where a vision adapter should read the image from
#[derive(Clone, PartialEq)]
pub enum ImageSource {
    /// Publicly reachable image URL
    Url(String),
    /// Raw image bytes with their MIME type
    Bytes { data: Vec<u8>, mime_type: String },
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Url(url) => f.debug_tuple("Url").field(url).finish(),
            ImageSource::Bytes { data, mime_type } => f
                .debug_struct("Bytes")
                .field("len", &data.len())
                .field("mime_type", mime_type)
                .finish(),
        }
    }
}

/// Capability-specific input; each adapter accepts exactly one variant
#[derive(Clone, PartialEq)]
pub enum CapabilityInput {
    /// Text generation from a prompt and optional history
    Llm {
        prompt: String,
        history: Vec<ChatTurn>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    },
    /// Speech synthesis of `text`
    Tts { text: String, voice: Option<String> },
    /// Transcription of an audio clip
    Stt {
        audio: Vec<u8>,
        mime_type: String,
        language: Option<String>,
    },
    /// Question about an image
    Vision { image: ImageSource, prompt: String },
}

impl fmt::Debug for CapabilityInput {
    // Audio and image bytes are summarized so logs stay readable.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityInput::Llm {
                prompt,
                history,
                temperature,
                max_tokens,
            } => f
                .debug_struct("Llm")
                .field("prompt", prompt)
                .field("history_len", &history.len())
                .field("temperature", temperature)
                .field("max_tokens", max_tokens)
                .finish(),
            CapabilityInput::Tts { text, voice } => f
                .debug_struct("Tts")
                .field("text", text)
                .field("voice", voice)
                .finish(),
            CapabilityInput::Stt {
                audio,
                mime_type,
                language,
            } => f
                .debug_struct("Stt")
                .field("audio_len", &audio.len())
                .field("mime_type", mime_type)
                .field("language", language)
                .finish(),
            CapabilityInput::Vision { image, prompt } => f
                .debug_struct("Vision")
                .field("image", image)
                .field("prompt", prompt)
                .finish(),
        }
    }
}

/// Reasons an input is rejected before any provider is contacted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("{capability} input must not have an empty {field}")]
    Empty {
        capability: Capability,
        field: &'static str,
    },

    #[error("temperature must be between 0.0 and 2.0, got {0}")]
    TemperatureOutOfRange(String),

    #[error("max_tokens must be greater than 0")]
    ZeroMaxTokens,

    #[error("input is for {actual} but {expected} was requested")]
    CapabilityMismatch {
        expected: Capability,
        actual: Capability,
    },
}

impl CapabilityInput {
    /// Plain LLM prompt with no history or sampling overrides
    pub fn llm(prompt: impl Into<String>) -> Self {
        CapabilityInput::Llm {
            prompt: prompt.into(),
            history: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn tts(text: impl Into<String>) -> Self {
        CapabilityInput::Tts {
            text: text.into(),
            voice: None,
        }
    }

    pub fn stt(audio: Vec<u8>, mime_type: impl Into<String>) -> Self {
        CapabilityInput::Stt {
            audio,
            mime_type: mime_type.into(),
            language: None,
        }
    }

    pub fn vision(image: ImageSource, prompt: impl Into<String>) -> Self {
        CapabilityInput::Vision {
            image,
            prompt: prompt.into(),
        }
    }

    /// The capability this input belongs to
    pub fn capability(&self) -> Capability {
        match self {
            CapabilityInput::Llm { .. } => Capability::Llm,
            CapabilityInput::Tts { .. } => Capability::Tts,
            CapabilityInput::Stt { .. } => Capability::Stt,
            CapabilityInput::Vision { .. } => Capability::Vision,
        }
    }

    /// Check the input is well formed for its capability
    pub fn validate(&self) -> Result<(), InputError> {
        let capability = self.capability();
        let empty = |field| InputError::Empty { capability, field };

        match self {
            CapabilityInput::Llm {
                prompt,
                temperature,
                max_tokens,
                ..
            } => {
                if prompt.trim().is_empty() {
                    return Err(empty("prompt"));
                }
                if let Some(t) = temperature {
                    if !(0.0..=2.0).contains(t) {
                        return Err(InputError::TemperatureOutOfRange(t.to_string()));
                    }
                }
                if *max_tokens == Some(0) {
                    return Err(InputError::ZeroMaxTokens);
                }
            }
            CapabilityInput::Tts { text, .. } => {
                if text.trim().is_empty() {
                    return Err(empty("text"));
                }
            }
            CapabilityInput::Stt {
                audio, mime_type, ..
            } => {
                if audio.is_empty() {
                    return Err(empty("audio"));
                }
                if mime_type.is_empty() {
                    return Err(empty("mime_type"));
                }
            }
            CapabilityInput::Vision { image, prompt } => {
                let image_empty = match image {
                    ImageSource::Url(url) => url.trim().is_empty(),
                    ImageSource::Bytes { data, .. } => data.is_empty(),
                };
                if image_empty {
                    return Err(empty("image"));
                }
                if let ImageSource::Bytes { mime_type, .. } = image {
                    if mime_type.trim().is_empty() {
                        return Err(empty("mime_type"));
                    }
                }
                if prompt.trim().is_empty() {
                    return Err(empty("prompt"));
                }
            }
        }

        Ok(())
    }

    /// Validate and additionally require the input to match `expected`
    pub fn validate_for(&self, expected: Capability) -> Result<(), InputError> {
        let actual = self.capability();
        if actual != expected {
            return Err(InputError::CapabilityMismatch { expected, actual });
        }
        self.validate()
    }
}

/// Normalized success payload returned by adapters
#[derive(Clone, PartialEq)]
pub enum Payload {
    /// Generated or descriptive text (LLM, vision)
    Text { text: String },
    /// Synthesized audio (TTS)
    Audio { data: Vec<u8>, mime_type: String },
    /// Recognized speech (STT)
    Transcript {
        text: String,
        language: Option<String>,
    },
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text { text } => f.debug_struct("Text").field("text", text).finish(),
            Payload::Audio { data, mime_type } => f
                .debug_struct("Audio")
                .field("len", &data.len())
                .field("mime_type", mime_type)
                .finish(),
            Payload::Transcript { text, language } => f
                .debug_struct("Transcript")
                .field("text", text)
                .field("language", language)
                .finish(),
        }
    }
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Payload::Text { text: text.into() }
    }

    /// Textual content, if this payload carries any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text { text } | Payload::Transcript { text, .. } => Some(text),
            Payload::Audio { .. } => None,
        }
    }
}

/// Per-request metadata passed from the caller to adapters unchanged
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Correlation id, sent to providers as `X-Request-ID`
    pub request_id: Uuid,

    /// Persona or system-prompt text for LLM and vision calls
    pub persona: Option<String>,

    /// Point after which no new attempt may start
    pub deadline: Option<Instant>,

    /// Opaque caller metadata
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Default for CallContext {
    fn default() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            persona: None,
            deadline: None,
            metadata: HashMap::new(),
        }
    }
}

impl CallContext {
    /// Create a context with a fresh request id
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the deadline relative to now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Whether the deadline, if any, has already passed
    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Outcome of routing a request, always tagged with a provider name
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResult {
    Success {
        provider_name: String,
        payload: Payload,
    },
    Failure {
        provider_name: String,
        reason: String,
    },
}

impl ProviderResult {
    pub fn success(provider_name: impl Into<String>, payload: Payload) -> Self {
        ProviderResult::Success {
            provider_name: provider_name.into(),
            payload,
        }
    }

    pub fn failure(provider_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ProviderResult::Failure {
            provider_name: provider_name.into(),
            reason: reason.into(),
        }
    }

    /// Failure attributed to the router rather than a provider
    pub fn router_failure(reason: impl Into<String>) -> Self {
        Self::failure(ROUTER_PROVIDER_NAME, reason)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProviderResult::Success { .. })
    }

    pub fn provider_name(&self) -> &str {
        match self {
            ProviderResult::Success { provider_name, .. }
            | ProviderResult::Failure { provider_name, .. } => provider_name,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            ProviderResult::Success { payload, .. } => Some(payload),
            ProviderResult::Failure { .. } => None,
        }
    }

    pub fn into_payload(self) -> Option<Payload> {
        match self {
            ProviderResult::Success { payload, .. } => Some(payload),
            ProviderResult::Failure { .. } => None,
        }
    }

    /// Text safe to show an end user.
    ///
    /// Failures always map to a generic message so provider names and raw
    /// error text never reach the UI. Audio payloads have no text and yield
    /// an empty string.
    pub fn user_message(&self) -> String {
        match self {
            ProviderResult::Success { payload, .. } => {
                payload.as_text().unwrap_or_default().to_string()
            }
            ProviderResult::Failure { .. } => SERVICE_UNAVAILABLE_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_names() {
        assert_eq!(Capability::Llm.as_str(), "llm");
        assert_eq!(Capability::Vision.to_string(), "vision");
        let parsed: Capability = serde_json::from_str("\"stt\"").unwrap();
        assert_eq!(parsed, Capability::Stt);
    }

    #[test]
    fn test_input_capability_and_validation() {
        assert_eq!(CapabilityInput::llm("hi").capability(), Capability::Llm);
        assert!(CapabilityInput::llm("hi").validate().is_ok());
        assert_eq!(
            CapabilityInput::llm("   ").validate(),
            Err(InputError::Empty {
                capability: Capability::Llm,
                field: "prompt"
            })
        );
        assert!(CapabilityInput::stt(vec![], "audio/wav").validate().is_err());
        assert!(CapabilityInput::vision(ImageSource::Url(String::new()), "what is this?")
            .validate()
            .is_err());
    }

    #[test]
    fn test_vision_bytes_need_mime_type() {
        let untyped = CapabilityInput::vision(
            ImageSource::Bytes {
                data: vec![0x89, b'P', b'N', b'G'],
                mime_type: " ".into(),
            },
            "what is this?",
        );
        assert_eq!(
            untyped.validate(),
            Err(InputError::Empty {
                capability: Capability::Vision,
                field: "mime_type"
            })
        );

        let typed = CapabilityInput::vision(
            ImageSource::Bytes {
                data: vec![0x89, b'P', b'N', b'G'],
                mime_type: "image/png".into(),
            },
            "what is this?",
        );
        assert!(typed.validate().is_ok());
    }

    #[test]
    fn test_llm_sampling_bounds() {
        let hot = CapabilityInput::Llm {
            prompt: "hi".into(),
            history: vec![],
            temperature: Some(2.5),
            max_tokens: None,
        };
        assert!(matches!(
            hot.validate(),
            Err(InputError::TemperatureOutOfRange(_))
        ));

        let zero = CapabilityInput::Llm {
            prompt: "hi".into(),
            history: vec![],
            temperature: None,
            max_tokens: Some(0),
        };
        assert_eq!(zero.validate(), Err(InputError::ZeroMaxTokens));
    }

    #[test]
    fn test_validate_for_mismatch() {
        let err = CapabilityInput::tts("hello")
            .validate_for(Capability::Llm)
            .unwrap_err();
        assert_eq!(
            err,
            InputError::CapabilityMismatch {
                expected: Capability::Llm,
                actual: Capability::Tts
            }
        );
    }

    #[test]
    fn test_user_message_hides_failure_details() {
        let failure = ProviderResult::failure("openai", "401 invalid api key sk-123");
        let message = failure.user_message();
        assert_eq!(message, SERVICE_UNAVAILABLE_MESSAGE);
        assert!(!message.contains("openai"));

        let success = ProviderResult::success("openai", Payload::text("Namaste!"));
        assert_eq!(success.user_message(), "Namaste!");
        assert_eq!(success.provider_name(), "openai");
    }

    #[test]
    fn test_debug_summarizes_bytes() {
        let input = CapabilityInput::stt(vec![0u8; 4096], "audio/webm");
        let rendered = format!("{:?}", input);
        assert!(rendered.contains("audio_len: 4096"));
        assert!(!rendered.contains("0, 0, 0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_deadline() {
        let ctx = CallContext::new().with_timeout(Duration::from_millis(50));
        assert!(!ctx.deadline_passed());
        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(ctx.deadline_passed());
        assert!(!CallContext::new().deadline_passed());
    }
}
