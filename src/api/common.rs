//! Common API utilities and shared types

use serde::Deserialize;

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size for the listing index
pub fn default_page_size() -> u32 {
    10
}

/// Page size for per-city listings
pub const CITY_PAGE_SIZE: u32 = 50;

/// Page size for per-tag listings
pub const TAG_PAGE_SIZE: u32 = 20;

/// Basic pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
}
