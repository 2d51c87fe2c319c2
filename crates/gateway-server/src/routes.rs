//! Route definitions for the gateway API.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{auth, handlers, middleware, state::AppState};

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        // OpenAI-compatible endpoints
        .nest("/v1", openai_routes(state.clone()))
        // Apply middleware
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        // Add state
        .with_state(state)
}

/// OpenAI-compatible API routes, behind the gateway key
fn openai_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/chat/completions", post(handlers::chat_completions))
        .route("/models", get(handlers::list_models))
        .route_layer(axum::middleware::from_fn_with_state(state, auth::auth_middleware))
}
