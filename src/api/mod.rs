//! HTTP API
//!
//! Thin axum layer over [`SlotStore`](crate::store::SlotStore): bearer token
//! extraction, JSON bodies, and error mapping.

pub mod error;
pub mod extract;
pub mod http;
pub mod rest;
pub mod state;

pub use error::ApiError;
pub use extract::CurrentUser;
pub use http::create_router;
pub use state::AppState;
