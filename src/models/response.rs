//! Response model
//!
//! This module provides:
//! - `Response` entity: a structured inquiry/offer against an advertisement
//! - `ResponseStatus` enum for the moderation state machine
//! - Input type for response creation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Unique identifier
    pub id: i64,
    /// Advertisement this response belongs to
    pub advertisement_id: i64,
    /// User who submitted the response
    pub sender_id: i64,
    /// Advertisement author at creation time; never re-resolved afterwards
    pub recipient_id: i64,
    /// Response text
    pub text: String,
    /// Moderation status
    pub status: ResponseStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Response {
    /// Check whether the given user is a participant (sender or recipient).
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.sender_id == user_id || self.recipient_id == user_id
    }
}

/// Response together with display metadata for list/detail views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseWithMeta {
    #[serde(flatten)]
    pub response: Response,
    /// Title of the advertisement
    pub advertisement_title: String,
    /// Slug of the advertisement
    pub advertisement_slug: String,
    /// Sender username
    pub sender_username: String,
    /// Recipient username
    pub recipient_username: String,
}

/// Moderation status of a response.
///
/// The only legal transitions are `New -> Accepted` and `New -> Rejected`;
/// both target states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// Freshly submitted, awaiting moderation
    New,
    /// Accepted by the recipient (terminal)
    Accepted,
    /// Rejected by the recipient (terminal)
    Rejected,
}

impl Default for ResponseStatus {
    fn default() -> Self {
        Self::New
    }
}

impl ResponseStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::New => "new",
            ResponseStatus::Accepted => "accepted",
            ResponseStatus::Rejected => "rejected",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new" => Some(ResponseStatus::New),
            "accepted" => Some(ResponseStatus::Accepted),
            "rejected" => Some(ResponseStatus::Rejected),
            _ => None,
        }
    }

    /// Whether a transition away from this state is allowed.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResponseStatus::New)
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new response
#[derive(Debug, Clone)]
pub struct CreateResponseInput {
    /// Advertisement the response targets
    pub advertisement_id: i64,
    /// Authenticated sender
    pub sender_id: i64,
    /// Advertisement author, frozen at creation time
    pub recipient_id: i64,
    /// Response text
    pub text: String,
}
