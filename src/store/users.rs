//! User registration and lookup

use crate::error::{SwapError, SwapResult};
use crate::types::{normalize_email, NewUser, User, UserId};

use super::SlotStore;

/// Register a user; emails are unique after normalization
pub fn register_user(store: &SlotStore, new_user: NewUser) -> SwapResult<User> {
    let name = new_user.name.trim().to_string();
    let email = normalize_email(&new_user.email);

    if name.is_empty() {
        return Err(SwapError::rejected("name must not be empty"));
    }
    if !is_plausible_email(&email) {
        return Err(SwapError::rejected("email address is malformed"));
    }
    if new_user.password_hash.is_empty() {
        return Err(SwapError::rejected("credential must not be empty"));
    }

    let user = store.transact(None, |tables, tx| {
        if tables.user_by_email(&email).is_some() {
            return Err(SwapError::conflict("email already registered"));
        }
        let user = User {
            id: tables.next_user_id(),
            name,
            email,
            password_hash: new_user.password_hash,
        };
        tx.save_user(user.clone());
        Ok(user)
    })?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(user)
}

pub fn get_user(store: &SlotStore, user_id: UserId) -> SwapResult<User> {
    store.read(|tables| tables.user(user_id).cloned().ok_or(SwapError::NotFound("user")))
}

pub fn find_user_by_email(store: &SlotStore, email: &str) -> SwapResult<User> {
    let email = normalize_email(email);
    store.read(|tables| {
        tables
            .user_by_email(&email)
            .cloned()
            .ok_or(SwapError::NotFound("user"))
    })
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    }
}
