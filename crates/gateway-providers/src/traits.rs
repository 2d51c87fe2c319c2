//! Provider seams used by the execution engine.

use async_trait::async_trait;
use gateway_core::{ChatRequest, ChatResponse, GatewayResult, Provider, RouteStep};
use std::time::Duration;

/// A client bound to one route step: a provider, a target model, a deadline,
/// and a conflict resolution directive.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Execute one chat completion call.
    ///
    /// The caller's request is never modified; the step's overrides are
    /// applied to a copy.
    async fn call(&self, request: &ChatRequest) -> GatewayResult<ChatResponse>;

    /// Provider name
    fn name(&self) -> &str;

    /// Whether the provider has credentials and an address
    fn is_available(&self) -> bool;
}

/// Builds a [`ChatProvider`] for a route step.
pub trait ProviderFactory: Send + Sync {
    /// Create a client for `step` against `provider`, with `timeout` already
    /// resolved from the step and the configured default.
    fn create(&self, provider: &Provider, step: &RouteStep, timeout: Duration) -> Box<dyn ChatProvider>;
}
