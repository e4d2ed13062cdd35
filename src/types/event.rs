//! Calendar event (slot) types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EventId, UserId};

/// Availability of a slot for trading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Not offered for trade
    #[default]
    Busy,
    /// Offered for trade by its owner
    Swappable,
    /// Locked by a pending swap request
    SwapPending,
}

impl EventStatus {
    /// Wire name of the status
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Busy => "BUSY",
            EventStatus::Swappable => "SWAPPABLE",
            EventStatus::SwapPending => "SWAP_PENDING",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A calendar slot with exactly one owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: EventStatus,
    /// Current owner
    #[serde(rename = "user_id")]
    pub owner: UserId,
}

impl Event {
    /// True when the slot may enter a new swap request
    pub fn is_swappable(&self) -> bool {
        self.status == EventStatus::Swappable
    }
}

/// Input for creating an event
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub status: EventStatus,
}

impl NewEvent {
    /// Create a BUSY event input
    pub fn new(
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            start_time,
            end_time,
            status: EventStatus::Busy,
        }
    }

    /// Set the initial status
    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }
}
