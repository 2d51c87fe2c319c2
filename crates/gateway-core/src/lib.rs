//! # Gateway Core
//!
//! Core types, routing model, and error handling for the AI Gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - Raw-preserving request and response envelopes
//! - Providers, routes, and route steps
//! - Error types, including the per-route failure aggregate
//! - Logging-safe content truncation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod request;
pub mod response;
pub mod route;
pub mod truncate;

// Re-export commonly used types
pub use error::{GatewayError, GatewayResult, RouteError, RouteStepError};
pub use request::{ChatRequest, Message, MessageContent};
pub use response::{ChatResponse, Choice, ModelObject, ModelsResponse, ResponseMessage, Usage};
pub use route::{
    ConflictResolution, Provider, Route, RouteStep, RoutingTable, UnknownConflictResolution,
    FALLBACK_TIMEOUT,
};
