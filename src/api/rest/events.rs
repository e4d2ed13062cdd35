//! Event endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::types::{Event, EventId, EventStatus, NewEvent};

/// Query parameters for a status change
#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub status: EventStatus,
}

/// POST /events
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(body): Json<NewEvent>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.store.create_event(user_id, body)?))
}

/// GET /events - the caller's own events
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Json<Vec<Event>> {
    Json(state.store.list_owned_events(user_id))
}

/// PATCH /events/:id?status=SWAPPABLE
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(event_id): Path<u64>,
    Query(params): Query<StatusParams>,
) -> Result<Json<Event>, ApiError> {
    let event = state
        .store
        .set_event_status(EventId(event_id), user_id, params.status)?;
    Ok(Json(event))
}

/// GET /events/swappable and GET /swappable-slots
pub async fn list_swappable(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Json<Vec<Event>> {
    Json(state.store.list_swappable_events(user_id))
}
