//! Custom Axum extractors for the gateway.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use gateway_core::ChatRequest;
use tracing::debug;

use crate::error::ApiError;

/// Header carrying the request id in both directions
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id taken from `x-request-id`, or freshly generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Id from the inbound headers, or a new UUID when absent or empty
    #[must_use]
    pub fn from_headers(headers: &http::HeaderMap) -> Self {
        let id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);
        Self(id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // The request id middleware has usually run already.
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(id.clone());
        }
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Chat completion body parsed into a raw-preserving [`ChatRequest`]
#[derive(Debug, Clone)]
pub struct ChatBody(pub ChatRequest);

#[async_trait]
impl<S> FromRequest<S> for ChatBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {e}")))?;

        let request = ChatRequest::from_slice(&bytes).map_err(|e| {
            debug!(error = %e, "Rejected chat completion body");
            ApiError::from(e)
        })?;

        Ok(Self(request))
    }
}
