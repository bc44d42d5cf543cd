//! Protocol module for capability request/response structures
//!
//! This module defines the uniform contract between callers, the router and
//! provider adapters. The structures are:
//! - Capability-typed, so each adapter declares exactly the input it accepts
//! - Validated at the router boundary rather than inside each adapter
//! - Free of provider-specific wire details

pub mod types;

pub use types::{
    CallContext, Capability, CapabilityInput, ChatRole, ChatTurn, ImageSource, InputError,
    Payload, ProviderResult, ROUTER_PROVIDER_NAME, SERVICE_UNAVAILABLE_MESSAGE,
};
