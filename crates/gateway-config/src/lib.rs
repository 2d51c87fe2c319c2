//! # Gateway Config
//!
//! YAML configuration for the AI Gateway: file discovery, `${NAME}`
//! environment substitution, defaults, and load-time validation. A validated
//! [`GatewayConfig`] converts into the core [`gateway_core::RoutingTable`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod error;
pub mod loader;
pub mod types;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, DEFAULT_CONFIG_FILE, SYSTEM_CONFIG_DIR};
pub use types::{
    GatewayConfig, ProviderConfig, RouteConfig, RouteStepConfig, DEFAULT_PORT, DEFAULT_TIMEOUT,
};
pub use validation::{duplicate_route_names, validate};
