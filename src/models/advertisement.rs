//! Advertisement model
//!
//! This module provides:
//! - `Advertisement` entity representing a classified listing
//! - Input types for creating and updating advertisements
//! - `AdFilter` and `AdSort` query types for the listing engine
//! - Pagination types shared by all list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Tag;

/// Advertisement entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advertisement {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug, derived once from the title
    pub slug: String,
    /// Listing title
    pub title: String,
    /// Listing description
    pub description: String,
    /// Asking price, non-negative
    pub price: f64,
    /// City the item is listed in
    pub city_id: i64,
    /// Category ID
    pub category_id: i64,
    /// Author user ID
    pub author_id: i64,
    /// Stored cover image path, if any
    #[serde(default)]
    pub cover: Option<String>,
    /// Detail-page view counter
    #[serde(default)]
    pub views: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Advertisement together with the related rows a listing page needs.
///
/// Produced by the repository's joined queries so rendering a page never
/// issues per-row secondary fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvertisementWithMeta {
    #[serde(flatten)]
    pub advertisement: Advertisement,
    /// Username of the author
    pub author_username: String,
    /// City display name
    pub city_name: String,
    /// City slug
    pub city_slug: String,
    /// Category display name
    pub category_name: String,
    /// Category slug
    pub category_slug: String,
    /// Tags attached to the listing
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Input for creating a new advertisement
#[derive(Debug, Clone)]
pub struct CreateAdvertisementInput {
    /// Listing title
    pub title: String,
    /// Listing description
    pub description: String,
    /// Asking price
    pub price: f64,
    /// Existing city selection (mutually exclusive with `city_name`)
    pub city_id: Option<i64>,
    /// Free-text new city name (mutually exclusive with `city_id`)
    pub city_name: Option<String>,
    /// Category ID
    pub category_id: i64,
    /// Author user ID
    pub author_id: i64,
    /// Tags to attach
    pub tag_ids: Vec<i64>,
    /// Stored cover image path
    pub cover: Option<String>,
}

/// Fully resolved record handed to the repository for insertion.
///
/// By this point the service has assigned the slug and resolved the city
/// selection down to an id.
#[derive(Debug, Clone)]
pub struct NewAdvertisement {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub city_id: i64,
    pub category_id: i64,
    pub author_id: i64,
    pub cover: Option<String>,
}

/// Input for updating an existing advertisement.
///
/// The slug is intentionally absent: it is derived once at creation and never
/// re-derived on subsequent saves.
#[derive(Debug, Clone, Default)]
pub struct UpdateAdvertisementInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub city_id: Option<i64>,
    pub city_name: Option<String>,
    pub category_id: Option<i64>,
    pub tag_ids: Option<Vec<i64>>,
    pub cover: Option<String>,
}

/// Filter parameters for the listing query engine.
///
/// An absent field means "no filter", never "match null".
#[derive(Debug, Clone, Default)]
pub struct AdFilter {
    /// Exact match on the category's slug
    pub category_slug: Option<String>,
    /// Exact match on the city's slug
    pub city_slug: Option<String>,
    /// Exact match on a tag's slug
    pub tag_slug: Option<String>,
    /// Case-insensitive substring match on title OR description
    pub query: Option<String>,
    /// Listings authored by this user ID
    pub author_id: Option<i64>,
    /// Listings authored by this username (case-insensitive)
    pub author_username: Option<String>,
}

/// Sort key for advertisement listings.
///
/// The set of accepted tokens is an explicit allow-list; the ORDER BY clause
/// is produced only from this enum, never from raw user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdSort {
    /// Oldest first
    CreatedAt,
    /// Newest first (the fallback order)
    #[default]
    CreatedAtDesc,
    /// Cheapest first
    Price,
    /// Most expensive first
    PriceDesc,
    /// Least viewed first
    Views,
    /// Most viewed first
    ViewsDesc,
}

impl AdSort {
    /// Parse a sort token. Returns `None` for anything outside the allow-list.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "created_at" => Some(AdSort::CreatedAt),
            "-created_at" => Some(AdSort::CreatedAtDesc),
            "price" => Some(AdSort::Price),
            "-price" => Some(AdSort::PriceDesc),
            "views" => Some(AdSort::Views),
            "-views" => Some(AdSort::ViewsDesc),
            _ => None,
        }
    }

    /// Parse an optional query parameter, falling back to newest-first for
    /// missing or unrecognized tokens.
    pub fn from_param(token: Option<&str>) -> Self {
        token.and_then(Self::parse).unwrap_or_default()
    }

    /// The ORDER BY clause for this sort key.
    pub fn order_clause(&self) -> &'static str {
        match self {
            AdSort::CreatedAt => "a.created_at ASC",
            AdSort::CreatedAtDesc => "a.created_at DESC",
            AdSort::Price => "a.price ASC",
            AdSort::PriceDesc => "a.price DESC",
            AdSort::Views => "a.views ASC",
            AdSort::ViewsDesc => "a.views DESC",
        }
    }
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        ((self.page.saturating_sub(1)) * self.per_page) as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items in the current page
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parse_allow_list() {
        assert_eq!(AdSort::parse("created_at"), Some(AdSort::CreatedAt));
        assert_eq!(AdSort::parse("-created_at"), Some(AdSort::CreatedAtDesc));
        assert_eq!(AdSort::parse("price"), Some(AdSort::Price));
        assert_eq!(AdSort::parse("-price"), Some(AdSort::PriceDesc));
        assert_eq!(AdSort::parse("views"), Some(AdSort::Views));
        assert_eq!(AdSort::parse("-views"), Some(AdSort::ViewsDesc));

        // Anything else is rejected outright
        assert_eq!(AdSort::parse("title"), None);
        assert_eq!(AdSort::parse("author__password"), None);
        assert_eq!(AdSort::parse("created_at; DROP TABLE users"), None);
        assert_eq!(AdSort::parse(""), None);
    }

    #[test]
    fn test_sort_fallback_is_newest_first() {
        assert_eq!(AdSort::from_param(None), AdSort::CreatedAtDesc);
        assert_eq!(AdSort::from_param(Some("bogus")), AdSort::CreatedAtDesc);
        assert_eq!(AdSort::from_param(Some("price")), AdSort::Price);
    }

    #[test]
    fn test_order_clause_never_echoes_input() {
        for token in ["created_at", "-created_at", "price", "-price", "views", "-views"] {
            let clause = AdSort::parse(token).unwrap().order_clause();
            assert!(clause.starts_with("a."));
            assert!(clause.ends_with("ASC") || clause.ends_with("DESC"));
        }
    }

    #[test]
    fn test_list_params() {
        let params = ListParams::new(1, 10);
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), 10);

        let params = ListParams::new(3, 5);
        assert_eq!(params.offset(), 10);
        assert_eq!(params.limit(), 5);

        // Page 0 should become 1
        let params = ListParams::new(0, 10);
        assert_eq!(params.page, 1);
        assert_eq!(params.offset(), 0);

        // per_page clamped to 100
        let params = ListParams::new(1, 200);
        assert_eq!(params.per_page, 100);
    }

    #[test]
    fn test_paged_result() {
        let params = ListParams::new(1, 10);
        let result = PagedResult::new(vec![1, 2, 3, 4, 5], 25, &params);

        assert_eq!(result.len(), 5);
        assert_eq!(result.total, 25);
        assert_eq!(result.total_pages(), 3);
        assert!(result.has_next());
        assert!(!result.has_prev());

        let params = ListParams::new(3, 10);
        let result = PagedResult::new(vec![21, 22, 23, 24, 25], 25, &params);
        assert!(!result.has_next());
        assert!(result.has_prev());
    }
}
