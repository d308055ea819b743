//! User model
//!
//! The user record is an identity reference: account creation, passwords and
//! login flows belong to the external identity provider. This system only
//! needs a stable id and a username to attribute listings and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identity reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

