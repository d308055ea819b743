//! City API endpoints
//!
//! - GET /api/v1/cities - city list
//! - GET /api/v1/cities/:slug/advertisements - listings in a city

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::api::common::{PaginationQuery, CITY_PAGE_SIZE};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{AdFilter, AdSort, ListParams};

/// Build the cities router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cities))
        .route("/{slug}/advertisements", get(city_advertisements))
}

/// GET /api/v1/cities
async fn list_cities(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let cities = state
        .city_service
        .list()
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(json!({ "cities": cities })))
}

/// GET /api/v1/cities/:slug/advertisements
///
/// City pages are browsed in bigger chunks than the index.
async fn city_advertisements(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let city = state
        .city_service
        .get_by_slug(&slug)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found(format!("City not found: {}", slug)))?;

    let filter = AdFilter {
        city_slug: Some(city.slug.clone()),
        ..Default::default()
    };
    let params = ListParams::new(query.page, CITY_PAGE_SIZE);

    let page = state
        .advertisement_service
        .list(&filter, AdSort::default(), &params)
        .await?;

    Ok(Json(json!({
        "city": city,
        "advertisements": page.items,
        "total": page.total,
        "page": page.page,
        "page_size": page.per_page,
        "total_pages": page.total_pages(),
    })))
}
