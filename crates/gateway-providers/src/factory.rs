//! Default HTTP provider factory.

use crate::client::ProviderClient;
use crate::traits::{ChatProvider, ProviderFactory};
use gateway_core::{Provider, RouteStep};
use reqwest::Client;
use std::time::Duration;

/// Builds [`ProviderClient`]s that share one pooled `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpProviderFactory {
    http: Client,
}

impl HttpProviderFactory {
    /// Create a factory with a fresh connection pool
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = Client::builder().pool_max_idle_per_host(100).build()?;
        Ok(Self::with_client(http))
    }

    /// Create a factory around an existing client
    #[must_use]
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn create(&self, provider: &Provider, step: &RouteStep, timeout: Duration) -> Box<dyn ChatProvider> {
        Box::new(
            ProviderClient::new(provider.clone(), step.model.clone(), self.http.clone())
                .with_timeout(timeout)
                .with_conflict_resolution(step.conflict_resolution),
        )
    }
}
