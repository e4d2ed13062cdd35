//! Read-only swap request projections

use crate::error::{SwapError, SwapResult};
use crate::types::{SwapId, SwapRequest, UserId};

use super::SlotStore;

pub fn get_swap(store: &SlotStore, swap_id: SwapId) -> SwapResult<SwapRequest> {
    store.read(|tables| {
        tables
            .swap(swap_id)
            .cloned()
            .ok_or(SwapError::NotFound("swap request"))
    })
}

/// Requests where `user_id` is the responder, any status
pub fn list_incoming(store: &SlotStore, user_id: UserId) -> Vec<SwapRequest> {
    store.read(|tables| {
        tables
            .swaps()
            .filter(|s| s.responder_id == user_id)
            .cloned()
            .collect()
    })
}

/// Requests made by `user_id`, any status
pub fn list_outgoing(store: &SlotStore, user_id: UserId) -> Vec<SwapRequest> {
    store.read(|tables| {
        tables
            .swaps()
            .filter(|s| s.requester_id == user_id)
            .cloned()
            .collect()
    })
}
