//! Provider adapters, retry and routing
//!
//! Adapters translate the uniform capability input into one provider's wire
//! format. The retry executor repeats a failing adapter under a fixed
//! exponential schedule, and the router walks an ordered list of adapters
//! until one succeeds.

pub mod adapter;
pub mod anthropic;
pub mod error;
pub mod openai;
pub mod registry;
pub mod retry;
pub mod routing;

pub use adapter::{Endpoint, ProviderAdapter, UnimplementedAdapter};
pub use anthropic::AnthropicAdapter;
pub use error::{AdapterResult, ProviderError};
pub use openai::{
    OpenAIChatAdapter, OpenAISpeechAdapter, OpenAITranscriptionAdapter, OpenAIVisionAdapter,
};
pub use registry::build_adapter;
pub use retry::{RetryExecutor, RetryExhausted, RetryPolicy, RetryPolicyError};
pub use routing::{
    ProviderAttempt, Router, RoutingReport, RoutingTable, RoutingTableBuilder, RoutingTableError,
    ALL_PROVIDERS_EXHAUSTED, DEADLINE_EXCEEDED,
};
