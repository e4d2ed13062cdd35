//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::rest::{events, swaps, users};
use super::state::AppState;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // Browser frontends are served from a separate origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/signup", post(users::signup))
        .route("/login", post(users::login))
        .route("/me", get(users::me))
        .route("/events", post(events::create_event).get(events::list_events))
        .route("/events/swappable", get(events::list_swappable))
        .route("/events/:id", patch(events::update_status))
        .route("/swappable-slots", get(events::list_swappable))
        .route("/swap/request", post(swaps::request_swap))
        .route("/swap/incoming", get(swaps::incoming))
        .route("/swap/outgoing", get(swaps::outgoing))
        .route("/swap/respond/:id", post(swaps::respond))
        .route("/swap/cancel/:id", post(swaps::cancel))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn home() -> Json<Value> {
    Json(json!({
        "message": "SlotSwap backend is running",
        "name": crate::NAME,
        "version": crate::VERSION,
    }))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
