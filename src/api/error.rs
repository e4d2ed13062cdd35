//! JSON error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::error::SwapError;

/// API error response, rendered as `{error, code}`
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            error: message.into(),
            code: code.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<SwapError> for ApiError {
    fn from(err: SwapError) -> Self {
        let status = match &err {
            SwapError::NotFound(_) => StatusCode::NOT_FOUND,
            SwapError::Rejected(_) => StatusCode::BAD_REQUEST,
            SwapError::Conflict(_) => StatusCode::CONFLICT,
            SwapError::Integrity(_) | SwapError::Storage(_) => {
                tracing::error!(error = %err, "request failed on store error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Hash(_) | AuthError::SecretFile(_) | AuthError::InvalidSecret(_) => {
                tracing::error!(error = %err, "credential handling failed");
                Self::internal(err.to_string())
            }
            _ => Self::unauthorized(err.to_string()),
        }
    }
}
