//! HTTP request handlers for the gateway API.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use gateway_core::{GatewayError, ModelObject, ModelsResponse};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::{
    error::ApiError,
    extractors::{ChatBody, RequestId},
    state::AppState,
    validation::validate_chat_request,
};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Version
    pub version: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// `ready` or `not_ready`
    pub status: &'static str,
    /// Number of configured routes
    pub routes: usize,
    /// Number of configured providers
    pub providers: usize,
    /// Providers missing credentials or an address
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unavailable_providers: Vec<String>,
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let manager = &state.manager;
    let unavailable_providers: Vec<String> = manager
        .providers()
        .iter()
        .filter(|p| !p.is_available())
        .map(|p| p.name.clone())
        .collect();

    let ready = !manager.routes().is_empty() && unavailable_providers.is_empty();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            status: if ready { "ready" } else { "not_ready" },
            routes: manager.routes().len(),
            providers: manager.providers().len(),
            unavailable_providers,
        }),
    )
}

/// List models endpoint (OpenAI compatible).
///
/// Each configured route is exposed as a model; a repeated route name is listed once.
#[instrument(skip(state))]
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let mut seen = HashSet::new();
    let data = state
        .manager
        .routes()
        .iter()
        .filter(|route| seen.insert(route.name.as_str()))
        .map(|route| ModelObject::new(route.name.clone()))
        .collect();

    Json(ModelsResponse::new(data))
}

/// Chat completion endpoint (OpenAI compatible).
///
/// On success the upstream body is returned byte for byte.
#[instrument(skip_all, fields(request_id = %request_id))]
pub async fn chat_completions(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ChatBody(body): ChatBody,
) -> Result<Response, ApiError> {
    if let Err(err) = validate_chat_request(&body) {
        warn!(request_id = %request_id, error = %err, "Invalid chat completion request");
        return Err(err.into());
    }

    let request_json = serde_json::to_string(&body.truncated_for_logging()).unwrap_or_default();
    info!(
        request_id = %request_id,
        model = %body.model(),
        messages = body.message_count(),
        request_json = %request_json,
        "Chat completion request"
    );

    let start = Instant::now();
    let result = state
        .manager
        .execute_with_cancellation(&body, &request_id, &state.shutdown_token())
        .await;

    match result {
        Ok(response) => {
            info!(
                request_id = %request_id,
                model = %body.model(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Chat completion successful"
            );

            Ok((
                [(header::CONTENT_TYPE, "application/json")],
                response.as_str().to_owned(),
            )
                .into_response())
        }
        Err(err) => {
            match &err {
                GatewayError::RouteNotFound { .. } => {
                    warn!(request_id = %request_id, model = %body.model(), "No route for model");
                }
                _ => error!(
                    request_id = %request_id,
                    model = %body.model(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    error = %err,
                    "Request execution failed"
                ),
            }
            Err(err.into())
        }
    }
}
