//! SlotSwap
//!
//! Calendar slot swapping: users mark slots as swappable and negotiate
//! one-to-one exchanges of ownership over them.
//!
//! # Modules
//!
//! - `types`: Core records (User, Event, SwapRequest) and journal records
//! - `store`: Transactional slot store with the event lifecycle and swap engine
//! - `journal`: Append-only JSONL journal, snapshots and rotation
//! - `error`: Store error taxonomy
//! - `config`: Environment configuration
//! - `auth`: Password hashing and bearer tokens
//! - `api`: Axum HTTP layer
//! - `utils`: Atomic file helpers
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use slot_swap::{EventStatus, NewEvent, NewUser, SlotStore, SwapStatus};
//!
//! let store = SlotStore::in_memory();
//! let alice = store
//!     .register_user(NewUser::new("Alice", "alice@example.com", "$2b$04$x"))
//!     .unwrap();
//! let bob = store.register_user(NewUser::new("Bob", "bob@example.com", "$2b$04$x")).unwrap();
//!
//! let start = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
//! let slot = |title: &str| {
//!     NewEvent::new(title, start, start + Duration::hours(1)).with_status(EventStatus::Swappable)
//! };
//! let mine = store.create_event(alice.id, slot("Standup")).unwrap();
//! let theirs = store.create_event(bob.id, slot("Review")).unwrap();
//!
//! let swap = store.create_swap(alice.id, mine.id, theirs.id).unwrap();
//! let swap = store.respond_to_swap(swap.id, bob.id, true).unwrap();
//! assert_eq!(swap.status, SwapStatus::Accepted);
//! assert_eq!(store.get_event(theirs.id).unwrap().owner, alice.id);
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod journal;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::Config;
pub use error::{SwapError, SwapResult};
pub use store::SlotStore;
pub use types::{
    Event, EventId, EventStatus, NewEvent, NewUser, SwapId, SwapRequest, SwapStatus, User, UserId,
    UserView,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
