//! Swap negotiation engine
//!
//! A swap request ties two events together. Creating it moves both events
//! from SWAPPABLE to SWAP_PENDING; accepting, rejecting or cancelling it
//! moves both back out. Each operation rewrites the request and both
//! events in a single transaction, and only a PENDING request can be
//! resolved, so a request changes state exactly once.

use crate::error::{SwapError, SwapResult};
use crate::types::{Event, EventId, EventStatus, SwapId, SwapRequest, SwapStatus, UserId};

use super::{now, SlotStore, Tables};

/// Propose exchanging `my_event_id` (owned by `requester`) for `their_event_id`
///
/// Both events must be SWAPPABLE when the write lock is taken; otherwise
/// the request is rejected and nothing changes.
pub fn create_swap(
    store: &SlotStore,
    requester: UserId,
    my_event_id: EventId,
    their_event_id: EventId,
) -> SwapResult<SwapRequest> {
    let result = store.transact(Some(requester), |tables, tx| {
        if my_event_id == their_event_id {
            return Err(SwapError::rejected("cannot swap a slot with itself"));
        }

        let mine = tables
            .event(my_event_id)
            .filter(|e| e.owner == requester && e.is_swappable())
            .ok_or_else(|| SwapError::rejected("ineligible slot"))?;
        let theirs = tables
            .event(their_event_id)
            .filter(|e| e.is_swappable())
            .ok_or_else(|| SwapError::rejected("ineligible slot"))?;

        if theirs.owner == requester {
            return Err(SwapError::rejected("both slots already belong to the requester"));
        }
        if tables.user(theirs.owner).is_none() {
            return Err(SwapError::integrity(format!(
                "event {} is owned by unknown user {}",
                theirs.id, theirs.owner
            )));
        }

        let timestamp = now();
        let swap = SwapRequest {
            id: tables.next_swap_id(),
            requester_id: requester,
            responder_id: theirs.owner,
            requester_event_id: mine.id,
            responder_event_id: theirs.id,
            status: SwapStatus::Pending,
            created_at: timestamp,
            updated_at: timestamp,
        };

        tx.save_event(with_status(mine, EventStatus::SwapPending));
        tx.save_event(with_status(theirs, EventStatus::SwapPending));
        tx.save_swap(swap.clone());
        Ok(swap)
    });

    match &result {
        Ok(swap) => tracing::info!(
            swap_id = %swap.id,
            requester = %swap.requester_id,
            responder = %swap.responder_id,
            "swap requested"
        ),
        Err(e) => tracing::debug!(
            requester = %requester,
            my_event = %my_event_id,
            their_event = %their_event_id,
            error = %e,
            "swap request refused"
        ),
    }
    result
}

/// Accept or reject a pending swap request
pub fn resolve_swap(store: &SlotStore, swap_id: SwapId, accept: bool) -> SwapResult<SwapRequest> {
    settle(store, swap_id, None, accept)
}

/// Accept or reject as `responder`; other users see `NotFound`
pub fn respond_to_swap(
    store: &SlotStore,
    swap_id: SwapId,
    responder: UserId,
    accept: bool,
) -> SwapResult<SwapRequest> {
    settle(store, swap_id, Some(responder), accept)
}

fn settle(
    store: &SlotStore,
    swap_id: SwapId,
    responder: Option<UserId>,
    accept: bool,
) -> SwapResult<SwapRequest> {
    let result = store.transact(responder, |tables, tx| {
        let swap = tables
            .swap(swap_id)
            .filter(|s| responder.map_or(true, |r| s.responder_id == r))
            .ok_or(SwapError::NotFound("swap request"))?;
        ensure_pending(swap)?;
        let (requester_event, responder_event) = locked_events(tables, swap)?;

        let (event_status, swap_status) = if accept {
            (EventStatus::Busy, SwapStatus::Accepted)
        } else {
            (EventStatus::Swappable, SwapStatus::Rejected)
        };

        let mut requester_event = with_status(requester_event, event_status);
        let mut responder_event = with_status(responder_event, event_status);
        if accept {
            requester_event.owner = swap.responder_id;
            responder_event.owner = swap.requester_id;
        }

        let resolved = with_swap_status(swap, swap_status);
        tx.save_event(requester_event);
        tx.save_event(responder_event);
        tx.save_swap(resolved.clone());
        Ok(resolved)
    });

    match &result {
        Ok(swap) => tracing::info!(swap_id = %swap_id, status = %swap.status, "swap resolved"),
        Err(e) => {
            tracing::debug!(swap_id = %swap_id, accept, error = %e, "swap resolution refused")
        }
    }
    result
}

/// Withdraw a pending request; only its requester may do so
///
/// Both events return to SWAPPABLE with owners unchanged.
pub fn cancel_swap(
    store: &SlotStore,
    swap_id: SwapId,
    requester: UserId,
) -> SwapResult<SwapRequest> {
    let result = store.transact(Some(requester), |tables, tx| {
        let swap = tables
            .swap(swap_id)
            .filter(|s| s.requester_id == requester)
            .ok_or(SwapError::NotFound("swap request"))?;
        ensure_pending(swap)?;
        let (requester_event, responder_event) = locked_events(tables, swap)?;

        let cancelled = with_swap_status(swap, SwapStatus::Cancelled);
        tx.save_event(with_status(requester_event, EventStatus::Swappable));
        tx.save_event(with_status(responder_event, EventStatus::Swappable));
        tx.save_swap(cancelled.clone());
        Ok(cancelled)
    });

    match &result {
        Ok(_) => tracing::info!(swap_id = %swap_id, "swap cancelled"),
        Err(e) => tracing::debug!(swap_id = %swap_id, error = %e, "swap cancellation refused"),
    }
    result
}

fn ensure_pending(swap: &SwapRequest) -> SwapResult<()> {
    if swap.is_pending() {
        Ok(())
    } else {
        Err(SwapError::conflict(format!(
            "swap request {} is already {}",
            swap.id, swap.status
        )))
    }
}

/// Both events of a pending request, checked against what it recorded
fn locked_events<'a>(tables: &'a Tables, swap: &SwapRequest) -> SwapResult<(&'a Event, &'a Event)> {
    let fetch = |id: EventId, owner: UserId| -> SwapResult<&'a Event> {
        let event = tables.event(id).ok_or_else(|| {
            SwapError::integrity(format!(
                "swap request {} references missing event {}",
                swap.id, id
            ))
        })?;
        if event.status != EventStatus::SwapPending || event.owner != owner {
            return Err(SwapError::integrity(format!(
                "event {} is {} and owned by {}, expected SWAP_PENDING owned by {}",
                id, event.status, event.owner, owner
            )));
        }
        Ok(event)
    };

    Ok((
        fetch(swap.requester_event_id, swap.requester_id)?,
        fetch(swap.responder_event_id, swap.responder_id)?,
    ))
}

fn with_status(event: &Event, status: EventStatus) -> Event {
    Event {
        status,
        ..event.clone()
    }
}

fn with_swap_status(swap: &SwapRequest, status: SwapStatus) -> SwapRequest {
    SwapRequest {
        status,
        updated_at: now(),
        ..swap.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{slot, user};

    struct Fixture {
        store: SlotStore,
        alice: UserId,
        bob: UserId,
        a_slot: Event,
        b_slot: Event,
    }

    fn fixture() -> Fixture {
        let store = SlotStore::in_memory();
        let alice = user(&store, "Alice");
        let bob = user(&store, "Bob");
        let a_slot = slot(&store, alice, 9, EventStatus::Swappable);
        let b_slot = slot(&store, bob, 14, EventStatus::Swappable);
        Fixture {
            store,
            alice,
            bob,
            a_slot,
            b_slot,
        }
    }

    #[test]
    fn test_create_locks_both_events() {
        let f = fixture();
        let swap = f.store.create_swap(f.alice, f.a_slot.id, f.b_slot.id).unwrap();

        assert_eq!(swap.status, SwapStatus::Pending);
        assert_eq!(swap.requester_id, f.alice);
        assert_eq!(swap.responder_id, f.bob);
        assert_eq!(swap.created_at, swap.updated_at);
        for id in swap.event_ids() {
            assert_eq!(f.store.get_event(id).unwrap().status, EventStatus::SwapPending);
        }
    }

    #[test]
    fn test_create_rejects_busy_target_without_changes() {
        let f = fixture();
        f.store.set_event_status(f.b_slot.id, f.bob, EventStatus::Busy).unwrap();

        let err = f.store.create_swap(f.alice, f.a_slot.id, f.b_slot.id).unwrap_err();
        assert!(matches!(err, SwapError::Rejected(_)));
        assert_eq!(f.store.get_event(f.a_slot.id).unwrap().status, EventStatus::Swappable);
        assert!(f.store.list_outgoing(f.alice).is_empty());
    }

    #[test]
    fn test_create_rejects_slot_not_owned_by_requester() {
        let f = fixture();
        let err = f.store.create_swap(f.alice, f.b_slot.id, f.a_slot.id).unwrap_err();
        assert!(matches!(err, SwapError::Rejected(_)));
    }

    #[test]
    fn test_create_rejects_self_swaps() {
        let f = fixture();
        let other = slot(&f.store, f.alice, 11, EventStatus::Swappable);

        let same = f.store.create_swap(f.alice, f.a_slot.id, f.a_slot.id).unwrap_err();
        assert!(matches!(same, SwapError::Rejected(_)));

        let own = f.store.create_swap(f.alice, f.a_slot.id, other.id).unwrap_err();
        assert!(matches!(own, SwapError::Rejected(_)));
        assert_eq!(f.store.get_event(other.id).unwrap().status, EventStatus::Swappable);
    }

    #[test]
    fn test_pending_event_cannot_join_second_swap() {
        let f = fixture();
        let carol = user(&f.store, "Carol");
        let c_slot = slot(&f.store, carol, 16, EventStatus::Swappable);
        f.store.create_swap(f.alice, f.a_slot.id, f.b_slot.id).unwrap();

        let err = f.store.create_swap(carol, c_slot.id, f.b_slot.id).unwrap_err();
        assert!(matches!(err, SwapError::Rejected(_)));
        assert_eq!(f.store.get_event(c_slot.id).unwrap().status, EventStatus::Swappable);
    }

    #[test]
    fn test_accept_exchanges_owners() {
        let f = fixture();
        let swap = f.store.create_swap(f.alice, f.a_slot.id, f.b_slot.id).unwrap();

        let resolved = f.store.resolve_swap(swap.id, true).unwrap();
        assert_eq!(resolved.status, SwapStatus::Accepted);
        assert!(resolved.updated_at >= swap.updated_at);
        assert_eq!(resolved.created_at, swap.created_at);

        let a_after = f.store.get_event(f.a_slot.id).unwrap();
        let b_after = f.store.get_event(f.b_slot.id).unwrap();
        assert_eq!(a_after.owner, f.bob);
        assert_eq!(b_after.owner, f.alice);
        assert_eq!(a_after.status, EventStatus::Busy);
        assert_eq!(b_after.status, EventStatus::Busy);
        assert_eq!(a_after.title, f.a_slot.title);
        assert_eq!(a_after.start_time, f.a_slot.start_time);
        assert_eq!(b_after.end_time, f.b_slot.end_time);
    }

    #[test]
    fn test_reject_releases_events() {
        let f = fixture();
        let swap = f.store.create_swap(f.alice, f.a_slot.id, f.b_slot.id).unwrap();

        let resolved = f.store.resolve_swap(swap.id, false).unwrap();
        assert_eq!(resolved.status, SwapStatus::Rejected);
        assert_eq!(f.store.get_event(f.a_slot.id).unwrap(), f.a_slot);
        assert_eq!(f.store.get_event(f.b_slot.id).unwrap(), f.b_slot);
    }

    #[test]
    fn test_second_resolution_conflicts() {
        let f = fixture();
        let swap = f.store.create_swap(f.alice, f.a_slot.id, f.b_slot.id).unwrap();
        f.store.resolve_swap(swap.id, true).unwrap();

        let err = f.store.resolve_swap(swap.id, true).unwrap_err();
        assert!(matches!(err, SwapError::Conflict(_)));
        let err = f.store.resolve_swap(swap.id, false).unwrap_err();
        assert!(matches!(err, SwapError::Conflict(_)));

        // ownership swapped once, not twice
        assert_eq!(f.store.get_event(f.a_slot.id).unwrap().owner, f.bob);
        assert_eq!(f.store.get_swap(swap.id).unwrap().status, SwapStatus::Accepted);
    }

    #[test]
    fn test_resolve_unknown_swap() {
        let f = fixture();
        assert!(matches!(
            f.store.resolve_swap(SwapId(77), true),
            Err(SwapError::NotFound("swap request"))
        ));
    }

    #[test]
    fn test_respond_requires_responder() {
        let f = fixture();
        let swap = f.store.create_swap(f.alice, f.a_slot.id, f.b_slot.id).unwrap();

        let err = f.store.respond_to_swap(swap.id, f.alice, true).unwrap_err();
        assert!(matches!(err, SwapError::NotFound(_)));
        assert!(f.store.get_swap(swap.id).unwrap().is_pending());

        let resolved = f.store.respond_to_swap(swap.id, f.bob, false).unwrap();
        assert_eq!(resolved.status, SwapStatus::Rejected);
    }

    #[test]
    fn test_cancel_by_requester() {
        let f = fixture();
        let swap = f.store.create_swap(f.alice, f.a_slot.id, f.b_slot.id).unwrap();

        let err = f.store.cancel_swap(swap.id, f.bob).unwrap_err();
        assert!(matches!(err, SwapError::NotFound(_)));

        let cancelled = f.store.cancel_swap(swap.id, f.alice).unwrap();
        assert_eq!(cancelled.status, SwapStatus::Cancelled);
        assert_eq!(f.store.get_event(f.a_slot.id).unwrap().status, EventStatus::Swappable);
        assert_eq!(f.store.get_event(f.b_slot.id).unwrap().owner, f.bob);

        let err = f.store.resolve_swap(swap.id, true).unwrap_err();
        assert!(matches!(err, SwapError::Conflict(_)));
        let err = f.store.cancel_swap(swap.id, f.alice).unwrap_err();
        assert!(matches!(err, SwapError::Conflict(_)));
    }

    #[test]
    fn test_events_reusable_after_rejection() {
        let f = fixture();
        let first = f.store.create_swap(f.alice, f.a_slot.id, f.b_slot.id).unwrap();
        f.store.resolve_swap(first.id, false).unwrap();

        let second = f.store.create_swap(f.bob, f.b_slot.id, f.a_slot.id).unwrap();
        assert_eq!(second.requester_id, f.bob);
        assert_eq!(second.responder_id, f.alice);
        assert_ne!(first.id, second.id);
    }
}
