//! # AI Gateway
//!
//! Lightweight OpenAI-compatible API gateway. Each configured route is exposed
//! as a model name and tries its provider/model steps in order until one
//! succeeds.
//!
//! ## Usage
//!
//! ```bash
//! # Start with ./config.yaml (or /etc/ai-gateway/config.yaml)
//! ai-gateway
//!
//! # Start with a custom config file
//! ai-gateway --config /path/to/config.yaml
//!
//! # Export spans over OTLP (binary built with `--features otlp`)
//! OTLP_ENDPOINT=http://collector:4317 ai-gateway
//! ```

use anyhow::Context;
use clap::Parser;
use gateway_config::{ConfigLoader, DEFAULT_CONFIG_FILE};
use gateway_providers::HttpProviderFactory;
use gateway_server::{AppState, Server, ServerConfig};
use gateway_telemetry::{init_tracing, shutdown_tracing, TracingConfig, TracingReporter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "ai-gateway", version, about)]
struct Cli {
    /// Configuration file, searched in the working directory then /etc/ai-gateway
    #[arg(short, long, env = "AI_GATEWAY_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

/// Application entry point
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let tracer = match init_tracing(&TracingConfig::from_env()) {
        Ok(tracer) => tracer,
        Err(e) => {
            eprintln!("Failed to initialize tracing: {e}");
            None
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), "Starting AI Gateway");

    let result = run(cli).await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Application failed");
    }

    shutdown_tracing(tracer);

    if result.is_err() {
        std::process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_file(cli.config)
        .load()
        .await
        .context("failed to load configuration")?;

    let factory = HttpProviderFactory::new().context("failed to build HTTP client")?;
    let state = AppState::from_config(&config, Arc::new(factory), Arc::new(TracingReporter::new()))
        .context("failed to build routing table")?;

    info!(
        port = config.port,
        providers = config.providers.len(),
        routes = ?config.route_names(),
        env_vars = ?config.env_vars,
        "Configuration loaded"
    );

    let server = Server::new(ServerConfig::new(config.bind_address()), state);
    server.run().await.context("server failed")?;

    Ok(())
}
