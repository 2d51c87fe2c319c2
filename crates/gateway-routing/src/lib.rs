//! # Gateway Routing
//!
//! Route resolution and execution for the AI Gateway.
//!
//! A request's `model` selects a route; the [`ExecutionManager`] then walks the
//! route's steps in order, falling back to the next step on any failure until
//! one succeeds or the route is exhausted.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod manager;
pub mod resolver;

pub use manager::ExecutionManager;
pub use resolver::RouteResolver;
pub use tokio_util::sync::CancellationToken;
