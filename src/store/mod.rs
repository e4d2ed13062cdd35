//! Slot Store - transactional entity store and swap engine
//!
//! Users, events and swap requests live in in-memory tables behind one
//! `RwLock`. Every write runs as a transaction under the write lock:
//! re-read the rows, check preconditions, stage full-row writes, append
//! them to the journal as one record, then apply them. A failed check or
//! a failed append leaves the tables untouched.

mod lifecycle;
mod negotiation;
mod query;
mod tables;
mod users;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::SwapResult;
use crate::journal::{Journal, JournalConfig, SnapshotRows};
use crate::types::{
    Event, EventId, EventStatus, NewEvent, NewUser, SwapId, SwapRequest, User, UserId,
};

pub use tables::{Tables, Tx};

struct Inner {
    tables: Tables,
    journal: Option<Journal>,
}

impl Inner {
    /// Write a snapshot if one is due; the committed transaction stands
    /// even when this fails.
    fn maybe_snapshot(&mut self) {
        let Some(journal) = self.journal.as_mut() else {
            return;
        };
        if !journal.should_snapshot() {
            return;
        }

        let users: Vec<User> = self.tables.users().cloned().collect();
        let events: Vec<Event> = self.tables.events().cloned().collect();
        let swaps: Vec<SwapRequest> = self.tables.swaps().cloned().collect();
        let rows = SnapshotRows {
            users: &users,
            events: &events,
            swaps: &swaps,
        };

        if let Err(e) = journal.write_snapshot(rows) {
            tracing::warn!(error = %e, "snapshot failed, journal keeps growing");
        }
    }
}

/// Transactional store for users, events and swap requests
pub struct SlotStore {
    inner: RwLock<Inner>,
}

impl SlotStore {
    /// Store without durability, for tests and ephemeral use
    pub fn in_memory() -> Self {
        Self {
            inner: RwLock::new(Inner {
                tables: Tables::default(),
                journal: None,
            }),
        }
    }

    /// Open a durable store, recovering state from the data directory
    pub fn open(config: JournalConfig) -> SwapResult<Self> {
        let mut journal = Journal::new(config);
        let recovery = journal.initialize()?;

        let mut tables = Tables::default();
        for change in recovery.changes {
            tables.apply(change);
        }

        let (users, events, swaps) = tables.counts();
        tracing::info!(users, events, swaps, "slot store opened");

        Ok(Self {
            inner: RwLock::new(Inner {
                tables,
                journal: Some(journal),
            }),
        })
    }

    /// True when writes are journaled to disk
    pub fn is_durable(&self) -> bool {
        self.inner.read().journal.is_some()
    }

    /// Run a read-only projection under the shared lock
    pub(crate) fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        f(&self.inner.read().tables)
    }

    /// Run a write transaction under the exclusive lock
    ///
    /// `f` sees the current tables and stages writes into `Tx`. Nothing is
    /// applied unless `f` succeeds and the journal append succeeds.
    pub(crate) fn transact<T>(
        &self,
        actor: Option<UserId>,
        f: impl FnOnce(&Tables, &mut Tx) -> SwapResult<T>,
    ) -> SwapResult<T> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let mut tx = Tx::default();
        let out = f(&inner.tables, &mut tx)?;
        if tx.is_empty() {
            return Ok(out);
        }

        let changes = tx.into_changes();
        if let Some(journal) = inner.journal.as_mut() {
            journal.append(actor, changes.clone())?;
        }
        for change in changes {
            inner.tables.apply(change);
        }

        inner.maybe_snapshot();
        Ok(out)
    }

    /// Force a snapshot now, regardless of the threshold
    pub fn snapshot(&self) -> SwapResult<()> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let Some(journal) = inner.journal.as_mut() else {
            return Ok(());
        };

        let users: Vec<User> = inner.tables.users().cloned().collect();
        let events: Vec<Event> = inner.tables.events().cloned().collect();
        let swaps: Vec<SwapRequest> = inner.tables.swaps().cloned().collect();
        journal.write_snapshot(SnapshotRows {
            users: &users,
            events: &events,
            swaps: &swaps,
        })?;
        Ok(())
    }
}

impl Default for SlotStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

// Operations from the submodules
impl SlotStore {
    // Users (users.rs)
    pub fn register_user(&self, user: NewUser) -> SwapResult<User> {
        users::register_user(self, user)
    }

    pub fn get_user(&self, user_id: UserId) -> SwapResult<User> {
        users::get_user(self, user_id)
    }

    pub fn find_user_by_email(&self, email: &str) -> SwapResult<User> {
        users::find_user_by_email(self, email)
    }

    // Event lifecycle (lifecycle.rs)
    pub fn create_event(&self, owner: UserId, event: NewEvent) -> SwapResult<Event> {
        lifecycle::create_event(self, owner, event)
    }

    pub fn set_event_status(
        &self,
        event_id: EventId,
        user_id: UserId,
        status: EventStatus,
    ) -> SwapResult<Event> {
        lifecycle::set_event_status(self, event_id, user_id, status)
    }

    pub fn get_event(&self, event_id: EventId) -> SwapResult<Event> {
        lifecycle::get_event(self, event_id)
    }

    pub fn list_owned_events(&self, user_id: UserId) -> Vec<Event> {
        lifecycle::list_owned_events(self, user_id)
    }

    pub fn list_swappable_events(&self, excluding: UserId) -> Vec<Event> {
        lifecycle::list_swappable_events(self, excluding)
    }

    // Swap negotiation (negotiation.rs)
    pub fn create_swap(
        &self,
        requester: UserId,
        my_event_id: EventId,
        their_event_id: EventId,
    ) -> SwapResult<SwapRequest> {
        negotiation::create_swap(self, requester, my_event_id, their_event_id)
    }

    pub fn resolve_swap(&self, swap_id: SwapId, accept: bool) -> SwapResult<SwapRequest> {
        negotiation::resolve_swap(self, swap_id, accept)
    }

    pub fn respond_to_swap(
        &self,
        swap_id: SwapId,
        responder: UserId,
        accept: bool,
    ) -> SwapResult<SwapRequest> {
        negotiation::respond_to_swap(self, swap_id, responder, accept)
    }

    pub fn cancel_swap(&self, swap_id: SwapId, requester: UserId) -> SwapResult<SwapRequest> {
        negotiation::cancel_swap(self, swap_id, requester)
    }

    // Queries (query.rs)
    pub fn get_swap(&self, swap_id: SwapId) -> SwapResult<SwapRequest> {
        query::get_swap(self, swap_id)
    }

    pub fn list_incoming(&self, user_id: UserId) -> Vec<SwapRequest> {
        query::list_incoming(self, user_id)
    }

    pub fn list_outgoing(&self, user_id: UserId) -> Vec<SwapRequest> {
        query::list_outgoing(self, user_id)
    }
}

/// Timestamp source for new and updated rows
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, TimeZone, Utc};

    use super::SlotStore;
    use crate::types::{Event, EventStatus, NewEvent, NewUser, UserId};

    pub fn user(store: &SlotStore, name: &str) -> UserId {
        store
            .register_user(NewUser::new(
                name,
                format!("{}@example.com", name.to_lowercase()),
                "$2b$04$notarealhash",
            ))
            .unwrap()
            .id
    }

    pub fn slot(store: &SlotStore, owner: UserId, hour: u32, status: EventStatus) -> Event {
        let start = Utc.with_ymd_and_hms(2024, 6, 3, hour, 0, 0).unwrap();
        store
            .create_event(
                owner,
                NewEvent::new(format!("slot {}h", hour), start, start + Duration::hours(1))
                    .with_status(status),
            )
            .unwrap()
    }
}
