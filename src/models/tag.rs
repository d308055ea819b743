//! Tag model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag entity.
///
/// Tags cut across categories and carry a display color chosen by the user
/// who created them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Tag name (unique)
    pub name: String,
    /// Display color as a hex string, e.g. `#ff8800`
    pub color: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Tag with listing count for the tag index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWithCount {
    /// The tag itself
    #[serde(flatten)]
    pub tag: Tag,
    /// Number of advertisements with this tag
    pub advertisement_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_with_count_flattens() {
        let tag = Tag {
            id: 1,
            slug: "velosipedy".to_string(),
            name: "Велосипеды".to_string(),
            color: "#3377ff".to_string(),
            created_at: chrono::Utc::now(),
        };
        let twc = TagWithCount {
            tag,
            advertisement_count: 7,
        };

        let value = serde_json::to_value(&twc).unwrap();
        assert_eq!(value["slug"], "velosipedy");
        assert_eq!(value["advertisement_count"], 7);
    }
}
