//! In-memory tables and the transaction staging area

use std::collections::{BTreeMap, HashMap};

use crate::types::{Change, Event, EventId, SwapId, SwapRequest, User, UserId};

/// All rows, keyed by id
///
/// Ids are dense and increasing, so `BTreeMap` iteration order is
/// insertion order.
#[derive(Debug, Default, Clone)]
pub struct Tables {
    users: BTreeMap<UserId, User>,
    events: BTreeMap<EventId, Event>,
    swaps: BTreeMap<SwapId, SwapRequest>,
    /// Normalized email -> user
    emails: HashMap<String, UserId>,
}

impl Tables {
    /// Apply one row write; writes are full-row upserts
    pub fn apply(&mut self, change: Change) {
        match change {
            Change::UserSaved(user) => {
                self.emails.insert(user.email.clone(), user.id);
                self.users.insert(user.id, user);
            }
            Change::EventSaved(event) => {
                self.events.insert(event.id, event);
            }
            Change::SwapSaved(swap) => {
                self.swaps.insert(swap.id, swap);
            }
        }
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    /// Lookup by already-normalized email
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.emails.get(email).and_then(|id| self.users.get(id))
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.get(&id)
    }

    pub fn swap(&self, id: SwapId) -> Option<&SwapRequest> {
        self.swaps.get(&id)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    pub fn swaps(&self) -> impl Iterator<Item = &SwapRequest> {
        self.swaps.values()
    }

    pub fn next_user_id(&self) -> UserId {
        UserId(self.users.keys().next_back().map_or(1, |id| id.0 + 1))
    }

    pub fn next_event_id(&self) -> EventId {
        EventId(self.events.keys().next_back().map_or(1, |id| id.0 + 1))
    }

    pub fn next_swap_id(&self) -> SwapId {
        SwapId(self.swaps.keys().next_back().map_or(1, |id| id.0 + 1))
    }

    /// Row counts as (users, events, swaps)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.users.len(), self.events.len(), self.swaps.len())
    }
}

/// Writes staged by one transaction, committed together or not at all
#[derive(Debug, Default)]
pub struct Tx {
    changes: Vec<Change>,
}

impl Tx {
    pub fn save_user(&mut self, user: User) {
        self.changes.push(Change::UserSaved(user));
    }

    pub fn save_event(&mut self, event: Event) {
        self.changes.push(Change::EventSaved(event));
    }

    pub fn save_swap(&mut self, swap: SwapRequest) {
        self.changes.push(Change::SwapSaved(swap));
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub(crate) fn into_changes(self) -> Vec<Change> {
        self.changes
    }
}
