//! Journal record types
//!
//! Every committed store transaction becomes one `JournalRecord`: an
//! ordered list of full-row upserts. Replaying the records in `seq` order
//! rebuilds the tables. Snapshots reuse `Change` for their rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Event, SwapRequest, User, UserId};

/// A single row write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Change {
    UserSaved(User),
    EventSaved(Event),
    SwapSaved(SwapRequest),
}

/// One committed transaction in the journal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalRecord {
    /// Monotonic sequence number, starting at 1
    pub seq: u64,

    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,

    /// User whose request produced the transaction, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<UserId>,

    pub changes: Vec<Change>,
}

impl JournalRecord {
    pub fn new(seq: u64, actor: Option<UserId>, changes: Vec<Change>) -> Self {
        Self {
            seq,
            timestamp: Utc::now(),
            actor,
            changes,
        }
    }

    /// Serialize to a single JSONL line
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Snapshot metadata - first line in snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Always "snapshot_meta"
    #[serde(rename = "type")]
    pub meta_type: String,

    /// Last journal sequence number folded into this snapshot
    pub last_seq: u64,

    pub created_at: DateTime<Utc>,

    pub user_count: usize,
    pub event_count: usize,
    pub swap_count: usize,

    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

impl SnapshotMeta {
    pub fn new(last_seq: u64, user_count: usize, event_count: usize, swap_count: usize) -> Self {
        Self {
            meta_type: "snapshot_meta".to_string(),
            last_seq,
            created_at: Utc::now(),
            user_count,
            event_count,
            swap_count,
            version: 1,
        }
    }

    /// Total number of rows that follow the metadata line
    pub fn row_count(&self) -> usize {
        self.user_count + self.event_count + self.swap_count
    }

    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
