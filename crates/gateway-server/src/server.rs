//! Server lifecycle: bind, serve, and shut down gracefully.
//!
//! On Ctrl-C or SIGTERM the listener stops accepting connections and in-flight
//! requests are given [`ServerConfig::graceful_timeout`] to finish. Requests
//! still running after that are cancelled and answer 503.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::{routes::create_router, state::AppState};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind, e.g. `0.0.0.0:8080`
    pub bind_address: String,
    /// Time in-flight requests get to finish after shutdown starts
    pub graceful_timeout: Duration,
}

impl ServerConfig {
    /// Create a configuration for `bind_address`
    #[must_use]
    pub fn new(bind_address: impl Into<String>) -> Self {
        Self {
            bind_address: bind_address.into(),
            graceful_timeout: Duration::from_secs(30),
        }
    }

    /// Set the graceful timeout
    #[must_use]
    pub fn with_graceful_timeout(mut self, timeout: Duration) -> Self {
        self.graceful_timeout = timeout;
        self
    }
}

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Requested address
        address: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Accept loop failed
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for the gateway
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Create a new server
    #[must_use]
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Serve until Ctrl-C or SIGTERM
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(async {
            shutdown_signal().await;
        })
        .await
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.config.bind_address)
            .await
            .map_err(|source| ServerError::Bind {
                address: self.config.bind_address.clone(),
                source,
            })?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local: SocketAddr = listener.local_addr()?;
        info!(address = %local, "Server listening");

        let cancel = self.state.shutdown_token();
        let grace = self.config.graceful_timeout;
        let app = create_router(self.state);

        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!(
                    graceful_timeout_ms = grace.as_millis() as u64,
                    "Shutting down, draining in-flight requests"
                );
                tokio::spawn(async move {
                    tokio::time::sleep(grace).await;
                    warn!("Graceful timeout elapsed, cancelling in-flight requests");
                    cancel.cancel();
                });
            })
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl-C or SIGTERM and returns the signal name
///
/// # Panics
/// Panics if signal handlers cannot be installed
#[allow(clippy::expect_used)]
pub async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
        "ctrl+c"
    };

    #[cfg(unix)]
    let sigterm = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
        "sigterm"
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<&'static str>();

    let signal_name = tokio::select! {
        name = ctrl_c => name,
        name = sigterm => name,
    };

    info!(signal = signal_name, "Received shutdown signal");
    signal_name
}
