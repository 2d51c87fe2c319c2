//! Error types for the gateway.
//!
//! Step-level failures (`Transport`, `UpstreamStatus`, `Parse` on a response) are
//! recovered by the execution loop and only surface through [`RouteError`] once
//! every step of a route has failed.

use crate::route::Route;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors produced by the route execution engine and its collaborators
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed JSON in a request or response
    #[error("invalid {target} JSON: {message}")]
    Parse {
        /// What was being parsed ("request" or "response")
        target: &'static str,
        /// Parser message
        message: String,
    },

    /// No route matches the requested model
    #[error("no route found for model '{model}'")]
    RouteNotFound {
        /// Requested model name
        model: String,
    },

    /// A route step references a provider missing from the configuration
    #[error("route '{route}' step {step_index}: provider '{provider}' not found")]
    ConfigurationFault {
        /// Route being executed
        route: String,
        /// Offending step index
        step_index: usize,
        /// Missing provider name
        provider: String,
    },

    /// Connection failure or deadline elapsed while calling a provider
    #[error("request to provider '{provider}' failed: {message}")]
    Transport {
        /// Provider name
        provider: String,
        /// Transport error message
        message: String,
        /// Whether the step timeout elapsed
        timed_out: bool,
    },

    /// Provider answered with a non-success HTTP status
    #[error("provider '{provider}' returned status {status}: {body}")]
    UpstreamStatus {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Every step of the route failed
    #[error(transparent)]
    RouteExhausted(RouteError),

    /// The caller cancelled the request while a step was in flight
    #[error("request cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Create a request parse error
    pub fn request_parse(message: impl fmt::Display) -> Self {
        Self::Parse {
            target: "request",
            message: message.to_string(),
        }
    }

    /// Create a response parse error
    pub fn response_parse(message: impl fmt::Display) -> Self {
        Self::Parse {
            target: "response",
            message: message.to_string(),
        }
    }

    /// Create a route-not-found error
    pub fn route_not_found(model: impl Into<String>) -> Self {
        Self::RouteNotFound {
            model: model.into(),
        }
    }

    /// Create a transport error
    pub fn transport(provider: impl Into<String>, message: impl Into<String>, timed_out: bool) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
            timed_out,
        }
    }

    /// Whether this failure is confined to a single route step
    #[must_use]
    pub fn is_step_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::UpstreamStatus { .. } | Self::Parse { .. }
        )
    }

    /// Stable machine-readable error code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "invalid_json",
            Self::RouteNotFound { .. } => "route_not_found",
            Self::ConfigurationFault { .. } => "configuration_fault",
            Self::Transport { timed_out: true, .. } => "upstream_timeout",
            Self::Transport { .. } => "upstream_unreachable",
            Self::UpstreamStatus { .. } => "upstream_status",
            Self::RouteExhausted(_) => "all_steps_failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<RouteError> for GatewayError {
    fn from(err: RouteError) -> Self {
        Self::RouteExhausted(err)
    }
}

/// Failure of a single route step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStepError {
    /// Position of the step in its route
    pub step_index: usize,
    /// Provider called by the step
    pub provider: String,
    /// Model requested from the provider
    pub model: String,
    /// Error message
    pub error: String,
}

/// Aggregate of every step failure after a route is exhausted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteError {
    /// The route that was executed
    pub route: Route,
    /// Step failures in step order
    pub errors: Vec<RouteStepError>,
}

impl RouteError {
    /// Create a new route error
    #[must_use]
    pub fn new(route: Route, errors: Vec<RouteStepError>) -> Self {
        Self { route, errors }
    }

    /// The last recorded step failure, used as the representative cause
    #[must_use]
    pub fn last_failure(&self) -> Option<&RouteStepError> {
        self.errors.last()
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last_failure() {
            None => write!(f, "all route steps failed for model '{}'", self.route.name),
            Some(last) => write!(
                f,
                "all route steps failed for model '{}', last error from {}/{}: {}",
                self.route.name, last.provider, last.model, last.error
            ),
        }
    }
}

impl std::error::Error for RouteError {}
