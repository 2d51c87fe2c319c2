//! HTTP projection of gateway errors.
//!
//! Every failure leaves the server as
//! `{"error": {"type", "message", "code"?, "details"?}}`.

use crate::validation::ValidationError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use gateway_core::GatewayError;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Error returned by handlers and middleware
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request outside of body parsing
    #[error("{0}")]
    BadRequest(String),

    /// Request body failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Missing or wrong gateway key
    #[error("Unauthorized")]
    Unauthorized,

    /// Failure from the execution engine
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// HTTP status for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Gateway(err) => match err {
                GatewayError::Parse { .. } => StatusCode::BAD_REQUEST,
                GatewayError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
                GatewayError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                GatewayError::ConfigurationFault { .. }
                | GatewayError::Transport { .. }
                | GatewayError::UpstreamStatus { .. }
                | GatewayError::RouteExhausted(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// Value of the envelope's `type` field
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "invalid_request_error",
            StatusCode::UNAUTHORIZED => "authentication_error",
            StatusCode::NOT_FOUND => "not_found_error",
            StatusCode::SERVICE_UNAVAILABLE => "service_unavailable",
            _ => "upstream_error",
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            Self::BadRequest(_) => None,
            Self::Validation(_) => Some("invalid_request"),
            Self::Unauthorized => Some("invalid_api_key"),
            Self::Gateway(err) => Some(err.code()),
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Gateway(GatewayError::RouteNotFound { model }) => {
                format!("No route configured for model '{model}'")
            }
            other => other.to_string(),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            Self::Gateway(GatewayError::RouteExhausted(route_error)) => {
                serde_json::to_value(route_error).ok()
            }
            Self::Gateway(GatewayError::ConfigurationFault {
                route,
                step_index,
                provider,
            }) => Some(json!({
                "route": route,
                "step_index": step_index,
                "provider": provider,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let envelope = ErrorEnvelope {
            error: ErrorBody {
                kind: self.error_type(),
                message: self.message(),
                code: self.code(),
                details: self.details(),
            },
        };

        let mut response = (status, Json(envelope)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"api\""),
            );
        }
        response
    }
}
