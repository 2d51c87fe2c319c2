//! # Gateway Server
//!
//! HTTP server implementation for the AI Gateway.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - OpenAI-compatible chat completions and models endpoints
//! - API key authentication and request id propagation
//! - Health and readiness probes
//! - Graceful shutdown handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod validation;

// Re-export main types
pub use error::ApiError;
pub use extractors::{ChatBody, RequestId, REQUEST_ID_HEADER};
pub use routes::create_router;
pub use server::{shutdown_signal, Server, ServerConfig, ServerError};
pub use state::AppState;
pub use validation::{validate_chat_request, ValidationError};
