//! Signup, login and profile endpoints

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::auth::{hash_password, verify_password, AuthError, TokenResponse};
use crate::error::SwapError;
use crate::types::{NewUser, UserView};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login credentials, sent as JSON or as an urlencoded form
///
/// Form clients may name the email field `username`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

#[async_trait]
impl<S> FromRequest<S> for LoginRequest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(body) = Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            Ok(body)
        } else {
            let Json(body) = Json::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            Ok(body)
        }
    }
}

/// POST /signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> Result<Json<UserView>, ApiError> {
    if body.password.is_empty() {
        return Err(ApiError::bad_request("password must not be empty"));
    }

    let cost = state.bcrypt_cost;
    let password = body.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))??;

    let user = state
        .store
        .register_user(NewUser::new(body.name, body.email, password_hash))?;
    Ok(Json(user.view()))
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: LoginRequest,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = match state.store.find_user_by_email(&body.email) {
        Ok(user) => user,
        Err(SwapError::NotFound(_)) => return Err(AuthError::InvalidCredentials.into()),
        Err(e) => return Err(e.into()),
    };

    let password = body.password;
    let stored = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if !valid {
        tracing::debug!(user_id = %user.id, "login refused");
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(Json(state.auth.issue_token(&user)?))
}

/// GET /me
pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<UserView>, ApiError> {
    Ok(Json(state.store.get_user(user_id)?.view()))
}
