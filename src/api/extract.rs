//! Bearer token extractor

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::error::ApiError;
use super::state::AppState;
use crate::auth::AuthError;
use crate::types::UserId;

/// The authenticated caller
///
/// Rejects with 401 when the header is missing, the token is invalid, or
/// the user it names no longer exists.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let user_id = state.auth.validate_authorization(header)?;
        if state.store.get_user(user_id).is_err() {
            return Err(ApiError::unauthorized("token subject no longer exists"));
        }
        Ok(CurrentUser(user_id))
    }
}
