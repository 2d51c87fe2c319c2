//! # API Key Authentication
//!
//! Clients present the gateway key either as `X-Api-Key: <key>` or as
//! `Authorization: Bearer <key>`. The explicit header wins when both are sent.
//! Health and readiness probes bypass the check.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::{error::ApiError, state::AppState};

/// Header carrying the key when `Authorization` is not used
pub const API_KEY_HEADER: &str = "x-api-key";

/// Paths served without authentication
pub const PUBLIC_PATHS: [&str; 2] = ["/health", "/ready"];

/// Whether `path` skips authentication
#[must_use]
pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

/// Key presented by the client, if any
#[must_use]
pub fn presented_key(headers: &HeaderMap) -> Option<&str> {
    let from_header = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    from_header.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .filter(|v| !v.is_empty())
    })
}

/// Authentication middleware
pub async fn auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if is_public_path(path) {
        return next.run(request).await;
    }

    let key = presented_key(request.headers());
    if key.is_some_and(|k| state.is_authorized(k)) {
        debug!(path = %path, "Request authenticated");
        return next.run(request).await;
    }

    warn!(path = %path, has_key = key.is_some(), "Authentication failed");
    ApiError::Unauthorized.into_response()
}
