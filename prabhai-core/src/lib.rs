//! PrabhAI Core Library
//!
//! Routes AI capability requests (LLM, text-to-speech, speech-to-text and
//! vision) across an ordered list of providers. Each provider is retried
//! with exponential backoff before the router falls back to the next one,
//! and callers always get a [`ProviderResult`] back, never a panic.
//!
//! ```no_run
//! use prabhai_core::{CallContext, Capability, CapabilityInput, Router};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let router = Router::load("prabhai.yaml")?;
//! let result = router
//!     .route(Capability::Llm, &CapabilityInput::llm("Namaste!"), &CallContext::new())
//!     .await;
//! println!("{}", result.user_message());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod http;
pub mod protocol;
pub mod providers;

pub use protocol::{
    CallContext, Capability, CapabilityInput, ChatRole, ChatTurn, ImageSource, InputError, Payload,
    ProviderResult,
};
pub use providers::{
    ProviderAdapter, ProviderError, RetryExecutor, RetryExhausted, RetryPolicy, Router,
    RoutingReport, RoutingTable,
};

/// Returns the version of the PrabhAI Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
