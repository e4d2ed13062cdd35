//! Event lifecycle: creation and the BUSY / SWAPPABLE / SWAP_PENDING machine
//!
//! Owners toggle BUSY and SWAPPABLE. SWAP_PENDING is entered and left only
//! by the swap negotiation engine.

use crate::error::{SwapError, SwapResult};
use crate::types::{Event, EventId, EventStatus, NewEvent, UserId};

use super::SlotStore;

/// Create an event owned by `owner`
pub fn create_event(store: &SlotStore, owner: UserId, new_event: NewEvent) -> SwapResult<Event> {
    let title = new_event.title.trim().to_string();
    if title.is_empty() {
        return Err(SwapError::rejected("title must not be empty"));
    }
    if new_event.end_time <= new_event.start_time {
        return Err(SwapError::rejected("end time must be after start time"));
    }
    if new_event.status == EventStatus::SwapPending {
        return Err(SwapError::rejected("an event cannot start out SWAP_PENDING"));
    }

    let event = store.transact(Some(owner), |tables, tx| {
        if tables.user(owner).is_none() {
            return Err(SwapError::NotFound("user"));
        }
        let event = Event {
            id: tables.next_event_id(),
            title,
            start_time: new_event.start_time,
            end_time: new_event.end_time,
            status: new_event.status,
            owner,
        };
        tx.save_event(event.clone());
        Ok(event)
    })?;

    tracing::info!(event_id = %event.id, user_id = %owner, status = %event.status, "event created");
    Ok(event)
}

/// Owner-initiated status change
///
/// Another user's event reports `NotFound`, the same as a missing one.
pub fn set_event_status(
    store: &SlotStore,
    event_id: EventId,
    user_id: UserId,
    status: EventStatus,
) -> SwapResult<Event> {
    let result = store.transact(Some(user_id), |tables, tx| {
        let event = tables
            .event(event_id)
            .filter(|e| e.owner == user_id)
            .ok_or(SwapError::NotFound("event"))?;

        if status == EventStatus::SwapPending {
            return Err(SwapError::rejected(
                "SWAP_PENDING is only set by creating a swap request",
            ));
        }
        if event.status == EventStatus::SwapPending {
            return Err(SwapError::conflict("event is locked by a pending swap request"));
        }
        if event.status == status {
            return Ok(event.clone());
        }

        let mut updated = event.clone();
        updated.status = status;
        tx.save_event(updated.clone());
        Ok(updated)
    });

    match &result {
        Ok(event) => tracing::info!(
            event_id = %event_id,
            user_id = %user_id,
            status = %event.status,
            "event status set"
        ),
        Err(e) => tracing::debug!(
            event_id = %event_id,
            user_id = %user_id,
            error = %e,
            "event status change refused"
        ),
    }
    result
}

pub fn get_event(store: &SlotStore, event_id: EventId) -> SwapResult<Event> {
    store.read(|tables| tables.event(event_id).cloned().ok_or(SwapError::NotFound("event")))
}

/// All events owned by `user_id`, in creation order
pub fn list_owned_events(store: &SlotStore, user_id: UserId) -> Vec<Event> {
    store.read(|tables| tables.events().filter(|e| e.owner == user_id).cloned().collect())
}

/// SWAPPABLE events owned by anyone except `excluding`
pub fn list_swappable_events(store: &SlotStore, excluding: UserId) -> Vec<Event> {
    store.read(|tables| {
        tables
            .events()
            .filter(|e| e.is_swappable() && e.owner != excluding)
            .cloned()
            .collect()
    })
}
