//! Shared handler state

use std::sync::Arc;

use crate::auth::JwtAuth;
use crate::store::SlotStore;

/// State shared by every request handler
pub struct AppState {
    /// The slot store
    pub store: Arc<SlotStore>,

    /// Token signer and validator
    pub auth: JwtAuth,

    /// bcrypt cost for hashing new passwords
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(store: Arc<SlotStore>, auth: JwtAuth, bcrypt_cost: u32) -> Self {
        Self {
            store,
            auth,
            bcrypt_cost,
        }
    }
}
