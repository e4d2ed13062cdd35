//! Journal - durable backing for the slot store
//!
//! - `Journal`: append-only log of committed transactions and recovery
//! - `SnapshotManager`: point-in-time copies of all rows
//! - `LogRotation`: archives journal records folded into a snapshot
//!
//! # Layout
//!
//! ```text
//! <data_dir>/
//!   journal.jsonl            one JournalRecord per line, fsync'd
//!   snapshots/latest.jsonl   SnapshotMeta line + one Change per row
//!   snapshots/previous.jsonl backup of the prior snapshot
//!   archive/journal_<a>_to_<b>.jsonl
//! ```
//!
//! Startup loads the latest snapshot (or its backup) and replays the
//! records whose `seq` is greater than the snapshot's `last_seq`.

mod log;
mod rotation;
mod snapshot;

pub use log::{Journal, JournalConfig, JournalError, JournalResult, Recovery};
pub use rotation::LogRotation;
pub use snapshot::{SnapshotManager, SnapshotRows};
