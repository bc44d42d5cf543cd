//! Adapter construction from provider configuration

use crate::config::{ProviderConfig, ProviderKind};
use crate::http::HttpClient;
use crate::providers::adapter::{Endpoint, ProviderAdapter, UnimplementedAdapter};
use crate::providers::anthropic::AnthropicAdapter;
use crate::providers::openai::{
    OpenAIChatAdapter, OpenAISpeechAdapter, OpenAITranscriptionAdapter, OpenAIVisionAdapter,
};
use crate::providers::routing::RoutingTableError;
use crate::protocol::Capability;
use std::sync::Arc;
use tracing::debug;

/// Build the adapter a provider entry describes.
///
/// The credential is read from the environment here, once. A missing
/// credential does not fail construction; the adapter reports
/// `MissingCredentials` when called so the router can fall through to the
/// next provider.
pub fn build_adapter(
    config: &ProviderConfig,
    http: &HttpClient,
) -> Result<Arc<dyn ProviderAdapter>, RoutingTableError> {
    if !config.kind.supports(config.capability) {
        return Err(RoutingTableError::UnsupportedCapability {
            provider: config.name.clone(),
            kind: config.kind.as_str(),
            capability: config.capability,
        });
    }

    let http = http.clone();
    let adapter: Arc<dyn ProviderAdapter> = match (config.kind, config.capability) {
        (ProviderKind::Unimplemented, capability) => {
            Arc::new(UnimplementedAdapter::new(config.name.clone(), capability))
        }
        (ProviderKind::OpenAi, Capability::Llm) => {
            Arc::new(OpenAIChatAdapter::new(endpoint(config)?, http))
        }
        (ProviderKind::OpenAi, Capability::Vision) => {
            Arc::new(OpenAIVisionAdapter::new(endpoint(config)?, http))
        }
        (ProviderKind::OpenAi, Capability::Tts) => Arc::new(OpenAISpeechAdapter::new(
            endpoint(config)?,
            http,
            config.voice.clone(),
        )),
        (ProviderKind::OpenAi, Capability::Stt) => {
            Arc::new(OpenAITranscriptionAdapter::new(endpoint(config)?, http))
        }
        (ProviderKind::Anthropic, capability) => Arc::new(
            AnthropicAdapter::new(endpoint(config)?, http, capability).map_err(|_| {
                RoutingTableError::UnsupportedCapability {
                    provider: config.name.clone(),
                    kind: config.kind.as_str(),
                    capability,
                }
            })?,
        ),
    };

    Ok(adapter)
}

fn endpoint(config: &ProviderConfig) -> Result<Endpoint, RoutingTableError> {
    let missing = |field: &'static str| RoutingTableError::IncompleteProvider {
        provider: config.name.clone(),
        field,
    };

    let endpoint = Endpoint::new(
        config.name.clone(),
        config.base_url().ok_or_else(|| missing("base_url"))?,
        config.model().ok_or_else(|| missing("model"))?,
        config.api_key_env().ok_or_else(|| missing("api_key_env"))?,
    );

    debug!(
        provider = %endpoint.name,
        kind = config.kind.as_str(),
        capability = %config.capability,
        base_url = %endpoint.base_url,
        model = %endpoint.model,
        credential = %endpoint.credential_hint(),
        "adapter endpoint resolved"
    );
    Ok(endpoint)
}
