//! Shared application state.

use gateway_config::{ConfigResult, GatewayConfig};
use gateway_providers::ProviderFactory;
use gateway_routing::{CancellationToken, ExecutionManager};
use gateway_telemetry::ExecutionReporter;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// State handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// Route execution engine
    pub manager: Arc<ExecutionManager>,
    api_key: Arc<SecretString>,
    shutdown: CancellationToken,
}

impl AppState {
    /// Create state around an execution manager and the key clients must present
    #[must_use]
    pub fn new(manager: Arc<ExecutionManager>, api_key: SecretString) -> Self {
        Self {
            manager,
            api_key: Arc::new(api_key),
            shutdown: CancellationToken::new(),
        }
    }

    /// Build state from a loaded configuration
    pub fn from_config(
        config: &GatewayConfig,
        factory: Arc<dyn ProviderFactory>,
        reporter: Arc<dyn ExecutionReporter>,
    ) -> ConfigResult<Self> {
        let manager = ExecutionManager::new(config.routing_table()?, factory, reporter);
        Ok(Self::new(
            Arc::new(manager),
            SecretString::new(config.api_key.expose_secret().clone()),
        ))
    }

    /// Whether `presented` is the configured gateway key.
    ///
    /// An unset gateway key accepts nothing.
    #[must_use]
    pub fn is_authorized(&self, presented: &str) -> bool {
        let expected = self.api_key.expose_secret();
        !expected.is_empty() && presented == expected.as_str()
    }

    /// Token cancelled once the shutdown grace period runs out
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
