//! Capability routing with ordered fallback
//!
//! The router owns a fixed, ordered list of adapters per capability. A call
//! walks that list strictly in order: each adapter gets the full retry
//! policy, the first success wins, and only when every adapter is exhausted
//! does the caller see a router failure. Routing never panics and never
//! returns an `Err`; the outcome is always a `ProviderResult`.

use crate::config::{ConfigError, ConfigValidator, PrabhaiConfig, ValidationError};
use crate::http::HttpClient;
use crate::protocol::{CallContext, Capability, CapabilityInput, ProviderResult};
use crate::providers::adapter::ProviderAdapter;
use crate::providers::registry::build_adapter;
use crate::providers::retry::{RetryExecutor, RetryPolicy};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Reason reported when every configured adapter failed
pub const ALL_PROVIDERS_EXHAUSTED: &str = "all providers exhausted";

/// Reason reported when the caller's deadline ended the walk
pub const DEADLINE_EXCEEDED: &str = "deadline exceeded";

/// Errors raised while assembling a routing table
#[derive(Debug, Error)]
pub enum RoutingTableError {
    #[error("routing list for {capability} names unknown provider '{provider}'")]
    UnknownProvider {
        capability: Capability,
        provider: String,
    },

    #[error("provider '{provider}' serves {actual} but is listed under {expected}")]
    CapabilityMismatch {
        provider: String,
        expected: Capability,
        actual: Capability,
    },

    #[error("{kind} provider '{provider}' has no adapter for {capability}")]
    UnsupportedCapability {
        provider: String,
        kind: &'static str,
        capability: Capability,
    },

    #[error("provider '{provider}' is missing '{field}'")]
    IncompleteProvider {
        provider: String,
        field: &'static str,
    },

    #[error("provider '{provider}' appears twice in the {capability} routing list")]
    DuplicateProvider {
        capability: Capability,
        provider: String,
    },

    #[error("no enabled providers for {capability}")]
    NoProviders { capability: Capability },

    #[error("invalid retry policy: {0}")]
    RetryPolicy(#[from] ValidationError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Ordered adapters per capability
#[derive(Clone, Default)]
pub struct RoutingTable {
    routes: HashMap<Capability, Vec<Arc<dyn ProviderAdapter>>>,
}

impl fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for capability in Capability::ALL {
            if let Some(adapters) = self.routes.get(&capability) {
                let names: Vec<&str> = adapters.iter().map(|a| a.name()).collect();
                map.entry(&capability, &names);
            }
        }
        map.finish()
    }
}

impl RoutingTable {
    pub fn builder() -> RoutingTableBuilder {
        RoutingTableBuilder::default()
    }

    /// Build adapters for every routing list in `config`.
    ///
    /// Disabled providers are left out of their list. A list that ends up
    /// empty is an error, since the capability would otherwise look
    /// configured but could never succeed.
    pub fn from_config(config: &PrabhaiConfig, http: &HttpClient) -> Result<Self, RoutingTableError> {
        let mut builder = Self::builder();

        for (capability, names) in config.routing.configured() {
            let mut adapters = Vec::with_capacity(names.len());
            for name in names {
                let provider = config.provider(name).ok_or_else(|| {
                    RoutingTableError::UnknownProvider {
                        capability,
                        provider: name.clone(),
                    }
                })?;

                if !provider.enabled {
                    debug!(provider = %name, %capability, "skipping disabled provider");
                    continue;
                }

                adapters.push(build_adapter(provider, http)?);
            }
            builder = builder.route(capability, adapters);
        }

        builder.build()
    }

    /// Adapters for a capability in preference order
    pub fn adapters(&self, capability: Capability) -> Option<&[Arc<dyn ProviderAdapter>]> {
        self.routes.get(&capability).map(Vec::as_slice)
    }

    /// Adapter names for a capability in preference order
    pub fn provider_names(&self, capability: Capability) -> Vec<&str> {
        self.adapters(capability)
            .map(|adapters| adapters.iter().map(|a| a.name()).collect())
            .unwrap_or_default()
    }

    /// Whether any adapter is routed for `capability`
    pub fn is_configured(&self, capability: Capability) -> bool {
        self.routes.contains_key(&capability)
    }
}

/// Builder for [`RoutingTable`]
#[derive(Default)]
pub struct RoutingTableBuilder {
    routes: Vec<(Capability, Vec<Arc<dyn ProviderAdapter>>)>,
}

impl RoutingTableBuilder {
    /// Set the ordered adapter list for a capability, replacing any earlier one
    pub fn route(mut self, capability: Capability, adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        self.routes.retain(|(c, _)| *c != capability);
        self.routes.push((capability, adapters));
        self
    }

    /// Append one adapter to the list for the capability it serves
    pub fn adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        let capability = adapter.capability();
        match self.routes.iter_mut().find(|(c, _)| *c == capability) {
            Some((_, adapters)) => adapters.push(adapter),
            None => self.routes.push((capability, vec![adapter])),
        }
        self
    }

    pub fn build(self) -> Result<RoutingTable, RoutingTableError> {
        let mut routes = HashMap::new();

        for (capability, adapters) in self.routes {
            if adapters.is_empty() {
                return Err(RoutingTableError::NoProviders { capability });
            }

            let mut seen = HashSet::new();
            for adapter in &adapters {
                if adapter.capability() != capability {
                    return Err(RoutingTableError::CapabilityMismatch {
                        provider: adapter.name().to_string(),
                        expected: capability,
                        actual: adapter.capability(),
                    });
                }
                if !seen.insert(adapter.name()) {
                    return Err(RoutingTableError::DuplicateProvider {
                        capability,
                        provider: adapter.name().to_string(),
                    });
                }
            }

            routes.insert(capability, adapters);
        }

        Ok(RoutingTable { routes })
    }
}

/// What happened at one adapter during a routed call
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderAttempt {
    /// Adapter name
    pub provider: String,

    /// Times the adapter was invoked
    pub attempts: u32,

    /// `ProviderError::kind()` of the final failure, `None` on success
    pub error_kind: Option<&'static str>,

    /// Final error message, `None` on success
    pub error: Option<String>,
}

impl ProviderAttempt {
    pub fn succeeded(&self) -> bool {
        self.error_kind.is_none()
    }
}

/// A routed result together with the per-adapter trail that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingReport {
    pub result: ProviderResult,
    pub attempts: Vec<ProviderAttempt>,
}

impl RoutingReport {
    fn new(result: ProviderResult, attempts: Vec<ProviderAttempt>) -> Self {
        Self { result, attempts }
    }

    /// Adapter invocations across the whole walk
    pub fn total_attempts(&self) -> u32 {
        self.attempts.iter().map(|a| a.attempts).sum()
    }

    /// Whether the result came from an adapter other than the first
    pub fn used_fallback(&self) -> bool {
        self.result.is_success() && self.attempts.len() > 1
    }
}

/// Routes capability requests across ordered providers.
///
/// Cloning is cheap and clones share the same table. The table and policy
/// are immutable, so concurrent `route` calls need no locking.
#[derive(Debug, Clone)]
pub struct Router {
    table: Arc<RoutingTable>,
    executor: RetryExecutor,
}

impl Router {
    pub fn new(table: RoutingTable, policy: RetryPolicy) -> Self {
        Self {
            table: Arc::new(table),
            executor: RetryExecutor::new(policy),
        }
    }

    /// Build the HTTP client, every adapter and the retry policy from config.
    ///
    /// The config is validated first, so one built in code gets the same
    /// checks as one loaded from a file.
    pub fn from_config(config: &PrabhaiConfig) -> Result<Self, RoutingTableError> {
        ConfigValidator::new().quiet_credentials().validate(config)?;
        let policy = config.retry.to_policy()?;
        let http = HttpClient::with_config(&config.connection)?;
        let table = RoutingTable::from_config(config, &http)?;

        info!(
            llm = ?table.provider_names(Capability::Llm),
            tts = ?table.provider_names(Capability::Tts),
            stt = ?table.provider_names(Capability::Stt),
            vision = ?table.provider_names(Capability::Vision),
            max_attempts = policy.max_attempts(),
            "router configured"
        );

        Ok(Self::new(table, policy))
    }

    /// Load a config file (YAML or JSON by extension) and build from it
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RoutingTableError> {
        let config = crate::config::load_from_path(path)?;
        Self::from_config(&config)
    }

    /// Build from the file named by `PRABHAI_CONFIG`
    pub fn from_env() -> Result<Self, RoutingTableError> {
        let config = crate::config::load_from_env()?;
        Self::from_config(&config)
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn policy(&self) -> &RetryPolicy {
        self.executor.policy()
    }

    /// Route a request and return only its outcome
    pub async fn route(
        &self,
        capability: Capability,
        input: &CapabilityInput,
        context: &CallContext,
    ) -> ProviderResult {
        self.route_with_report(capability, input, context).await.result
    }

    /// Route a request and return its outcome with the per-adapter trail
    pub async fn route_with_report(
        &self,
        capability: Capability,
        input: &CapabilityInput,
        context: &CallContext,
    ) -> RoutingReport {
        let request_id = context.request_id;

        if let Err(e) = input.validate_for(capability) {
            warn!(%request_id, %capability, error = %e, "rejecting invalid input");
            return RoutingReport::new(
                ProviderResult::router_failure(format!("invalid input: {}", e)),
                Vec::new(),
            );
        }

        let Some(adapters) = self.table.adapters(capability) else {
            warn!(%request_id, %capability, "no providers configured");
            return RoutingReport::new(
                ProviderResult::router_failure(format!("no providers configured for {}", capability)),
                Vec::new(),
            );
        };

        let mut trail = Vec::with_capacity(adapters.len());

        for (index, adapter) in adapters.iter().enumerate() {
            if context.deadline_passed() {
                return self.deadline_failure(capability, context, trail);
            }

            debug!(
                %request_id,
                %capability,
                provider = adapter.name(),
                position = index + 1,
                of = adapters.len(),
                "trying provider"
            );

            let mut calls = 0u32;
            let outcome = self
                .executor
                .execute_until(adapter.name(), context.deadline, || {
                    calls += 1;
                    adapter.call(input, context)
                })
                .await;

            match outcome {
                Ok(payload) => {
                    trail.push(ProviderAttempt {
                        provider: adapter.name().to_string(),
                        attempts: calls,
                        error_kind: None,
                        error: None,
                    });
                    info!(
                        %request_id,
                        %capability,
                        provider = adapter.name(),
                        attempts = calls,
                        fallback = index > 0,
                        "request routed"
                    );
                    return RoutingReport::new(
                        ProviderResult::success(adapter.name(), payload),
                        trail,
                    );
                }
                Err(exhausted) => {
                    warn!(
                        %request_id,
                        %capability,
                        provider = adapter.name(),
                        attempts = exhausted.attempts,
                        error_kind = exhausted.last_error.kind(),
                        misconfigured = exhausted.last_error.is_misconfiguration(),
                        error = %exhausted.last_error,
                        "provider exhausted, moving to next"
                    );
                    trail.push(ProviderAttempt {
                        provider: adapter.name().to_string(),
                        attempts: exhausted.attempts,
                        error_kind: Some(exhausted.last_error.kind()),
                        error: Some(exhausted.last_error.to_string()),
                    });
                    if context.deadline_passed() {
                        return self.deadline_failure(capability, context, trail);
                    }
                }
            }
        }

        error!(
            %request_id,
            %capability,
            providers = trail.len(),
            "all providers exhausted"
        );
        RoutingReport::new(ProviderResult::router_failure(ALL_PROVIDERS_EXHAUSTED), trail)
    }

    fn deadline_failure(
        &self,
        capability: Capability,
        context: &CallContext,
        trail: Vec<ProviderAttempt>,
    ) -> RoutingReport {
        error!(
            request_id = %context.request_id,
            %capability,
            providers_tried = trail.len(),
            "deadline exceeded before a provider succeeded"
        );
        RoutingReport::new(ProviderResult::router_failure(DEADLINE_EXCEEDED), trail)
    }
}
