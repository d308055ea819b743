//! Category API endpoints
//!
//! - GET /api/v1/categories - category list
//! - GET /api/v1/categories/:slug/advertisements - listings in a category

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::api::common::{default_page_size, PaginationQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{AdFilter, AdSort, ListParams};

/// Build the categories router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/{slug}/advertisements", get(category_advertisements))
}

/// GET /api/v1/categories
async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let categories = state.category_service.list().await?;

    Ok(Json(json!({ "categories": categories })))
}

/// GET /api/v1/categories/:slug/advertisements
async fn category_advertisements(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .category_service
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Category not found: {}", slug)))?;

    let filter = AdFilter {
        category_slug: Some(category.slug.clone()),
        ..Default::default()
    };
    let params = ListParams::new(query.page, default_page_size());

    let page = state
        .advertisement_service
        .list(&filter, AdSort::default(), &params)
        .await?;

    Ok(Json(json!({
        "category": category,
        "advertisements": page.items,
        "total": page.total,
        "page": page.page,
        "page_size": page.per_page,
        "total_pages": page.total_pages(),
    })))
}
