//! Data types for the SlotSwap engine
//!
//! This module contains the records held by the store (users, calendar
//! events, swap requests) and the journal records that persist them.

mod event;
mod ids;
mod journal;
mod swap;
mod user;

pub use event::{Event, EventStatus, NewEvent};
pub use ids::{EventId, SwapId, UserId};
pub use journal::{Change, JournalRecord, SnapshotMeta};
pub use swap::{SwapRequest, SwapStatus};
pub use user::{NewUser, User, UserView};

pub(crate) use user::normalize_email;
