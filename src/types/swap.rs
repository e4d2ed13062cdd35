//! Swap request types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EventId, SwapId, UserId};

/// Lifecycle of a swap request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl SwapStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SwapStatus::Pending => "PENDING",
            SwapStatus::Accepted => "ACCEPTED",
            SwapStatus::Rejected => "REJECTED",
            SwapStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposal to exchange ownership of two events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub id: SwapId,
    pub requester_id: UserId,
    /// Owner of the responder event when the request was made
    pub responder_id: UserId,
    pub requester_event_id: EventId,
    pub responder_event_id: EventId,
    pub status: SwapStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SwapRequest {
    pub fn is_pending(&self) -> bool {
        self.status == SwapStatus::Pending
    }

    /// Both event ids referenced by this request
    pub fn event_ids(&self) -> [EventId; 2] {
        [self.requester_event_id, self.responder_event_id]
    }
}
