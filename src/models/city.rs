//! City model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// City entity. Created by the seed loader or inline from the listing form;
/// never deleted automatically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct City {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// City name (unique)
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
