//! Swap request endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::types::{EventId, SwapId, SwapRequest};

#[derive(Debug, Deserialize)]
pub struct CreateSwapRequest {
    pub my_slot_id: EventId,
    pub their_slot_id: EventId,
}

#[derive(Debug, Deserialize)]
pub struct SwapResponse {
    pub accept: bool,
}

/// POST /swap/request
pub async fn request_swap(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(body): Json<CreateSwapRequest>,
) -> Result<Json<SwapRequest>, ApiError> {
    let swap = state
        .store
        .create_swap(user_id, body.my_slot_id, body.their_slot_id)?;
    Ok(Json(swap))
}

/// GET /swap/incoming
pub async fn incoming(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Json<Vec<SwapRequest>> {
    Json(state.store.list_incoming(user_id))
}

/// GET /swap/outgoing
pub async fn outgoing(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Json<Vec<SwapRequest>> {
    Json(state.store.list_outgoing(user_id))
}

/// POST /swap/respond/:id - only the responder may answer
pub async fn respond(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(swap_id): Path<u64>,
    Json(body): Json<SwapResponse>,
) -> Result<Json<SwapRequest>, ApiError> {
    let swap = state
        .store
        .respond_to_swap(SwapId(swap_id), user_id, body.accept)?;
    Ok(Json(swap))
}

/// POST /swap/cancel/:id - only the requester may cancel
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(swap_id): Path<u64>,
) -> Result<Json<SwapRequest>, ApiError> {
    Ok(Json(state.store.cancel_swap(SwapId(swap_id), user_id)?))
}
