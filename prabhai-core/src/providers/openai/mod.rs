//! OpenAI provider implementation
//!
//! This module provides adapters for the OpenAI API, translating between
//! PrabhAI's capability inputs and OpenAI's request and response formats.

mod client;
pub mod converter;
pub mod types;

pub use client::{
    OpenAIChatAdapter, OpenAISpeechAdapter, OpenAITranscriptionAdapter, OpenAIVisionAdapter,
    DEFAULT_VOICE,
};
