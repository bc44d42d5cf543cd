//! Routing demo
//!
//! With `PRABHAI_CONFIG` pointing at a config file, routes one LLM prompt
//! through the configured providers. Without it, routes through an
//! in-process table whose first provider is a placeholder, showing the
//! fallback and the per-provider trail.
//!
//! Run with: RUST_LOG=prabhai_core=debug cargo run --example routing_demo

use anyhow::Context;
use async_trait::async_trait;
use prabhai_core::config::CONFIG_PATH_ENV;
use prabhai_core::providers::{AdapterResult, RoutingTable, UnimplementedAdapter};
use prabhai_core::{
    CallContext, Capability, CapabilityInput, Payload, ProviderAdapter, RetryPolicy, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Answers locally by echoing the prompt
struct EchoAdapter;

#[async_trait]
impl ProviderAdapter for EchoAdapter {
    fn name(&self) -> &str {
        "echo"
    }

    fn capability(&self) -> Capability {
        Capability::Llm
    }

    async fn call(&self, input: &CapabilityInput, _context: &CallContext) -> AdapterResult<Payload> {
        let CapabilityInput::Llm { prompt, .. } = input else {
            return Ok(Payload::text("(not a prompt)"));
        };
        Ok(Payload::text(format!("You said: {}", prompt)))
    }
}

fn local_router() -> anyhow::Result<Router> {
    let table = RoutingTable::builder()
        .adapter(Arc::new(UnimplementedAdapter::new("gemini-llm", Capability::Llm)))
        .adapter(Arc::new(EchoAdapter))
        .build()?;
    let policy = RetryPolicy::new(2, Duration::from_millis(200), 2.0)?;
    Ok(Router::new(table, policy))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("prabhai_core=info")),
        )
        .init();

    let router = if std::env::var_os(CONFIG_PATH_ENV).is_some() {
        Router::from_env().context("failed to build router from config")?
    } else {
        println!("{} not set, using the in-process demo table\n", CONFIG_PATH_ENV);
        local_router()?
    };

    let context = CallContext::new()
        .with_persona("You are Prabh, a warm and concise guide.")
        .with_timeout(Duration::from_secs(30));
    let input = CapabilityInput::llm("Say namaste and introduce yourself in one line.");

    let report = router.route_with_report(Capability::Llm, &input, &context).await;

    println!("request id : {}", context.request_id);
    println!("answered by: {}", report.result.provider_name());
    println!("reply      : {}", report.result.user_message());
    println!("\nprovider trail:");
    for attempt in &report.attempts {
        match (&attempt.error_kind, &attempt.error) {
            (Some(kind), Some(error)) => println!(
                "  {:<12} {} attempt(s), {} ({})",
                attempt.provider, attempt.attempts, kind, error
            ),
            _ => println!("  {:<12} {} attempt(s), ok", attempt.provider, attempt.attempts),
        }
    }

    Ok(())
}
