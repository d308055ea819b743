//! Advertisement API endpoints
//!
//! Handles HTTP requests for listings:
//! - GET /api/v1/advertisements - filtered/sorted/paginated index
//! - GET /api/v1/advertisements/my - current identity's listings
//! - GET /api/v1/advertisements/admin - listings authored by "admin"
//! - POST /api/v1/advertisements - create
//! - GET /api/v1/advertisements/:slug - detail (bumps the view counter)
//! - PUT /api/v1/advertisements/:slug - update (author only)
//! - DELETE /api/v1/advertisements/:slug - delete (author only)
//! - GET /api/v1/advertisements/:slug/similar - related listings

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::common::{default_page, default_page_size};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    AdFilter, AdSort, CreateAdvertisementInput, ListParams, UpdateAdvertisementInput,
};

/// Query parameters for the listing index
#[derive(Debug, Deserialize)]
pub struct ListAdvertisementsQuery {
    /// Category slug filter
    pub category: Option<String>,
    /// City slug filter
    pub city: Option<String>,
    /// Tag slug filter
    pub tag: Option<String>,
    /// Free-text search over title and description
    pub q: Option<String>,
    /// Sort token; anything outside the allow-list falls back to newest-first
    pub sort: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Request body for creating an advertisement
#[derive(Debug, Deserialize)]
pub struct CreateAdvertisementRequest {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub city_id: Option<i64>,
    pub city_name: Option<String>,
    pub category_id: i64,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    pub cover: Option<String>,
}

/// Request body for updating an advertisement
#[derive(Debug, Deserialize)]
pub struct UpdateAdvertisementRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub city_id: Option<i64>,
    pub city_name: Option<String>,
    pub category_id: Option<i64>,
    pub tag_ids: Option<Vec<i64>>,
    pub cover: Option<String>,
}

/// GET /api/v1/advertisements - listing index
pub async fn list_advertisements(
    State(state): State<AppState>,
    Query(query): Query<ListAdvertisementsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = AdFilter {
        category_slug: query.category,
        city_slug: query.city,
        tag_slug: query.tag,
        query: query.q,
        ..Default::default()
    };
    let sort = AdSort::from_param(query.sort.as_deref());
    let params = ListParams::new(query.page, query.page_size);

    let page = state
        .advertisement_service
        .list(&filter, sort, &params)
        .await?;

    Ok(Json(json!({
        "advertisements": page.items,
        "total": page.total,
        "page": page.page,
        "page_size": page.per_page,
        "total_pages": page.total_pages(),
    })))
}

/// GET /api/v1/advertisements/my - current identity's listings
pub async fn my_advertisements(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<crate::api::common::PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = AdFilter {
        author_id: Some(user.0.id),
        ..Default::default()
    };
    let params = ListParams::new(query.page, default_page_size());

    let page = state
        .advertisement_service
        .list(&filter, AdSort::default(), &params)
        .await?;

    Ok(Json(json!({
        "advertisements": page.items,
        "total": page.total,
        "page": page.page,
        "page_size": page.per_page,
        "total_pages": page.total_pages(),
    })))
}

/// GET /api/v1/advertisements/admin - listings authored by the "admin"
/// identity (case-insensitive)
pub async fn admin_advertisements(
    State(state): State<AppState>,
    Query(query): Query<crate::api::common::PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = AdFilter {
        author_username: Some("admin".to_string()),
        ..Default::default()
    };
    let params = ListParams::new(query.page, default_page_size());

    let page = state
        .advertisement_service
        .list(&filter, AdSort::default(), &params)
        .await?;

    Ok(Json(json!({
        "advertisements": page.items,
        "total": page.total,
        "page": page.page,
        "page_size": page.per_page,
        "total_pages": page.total_pages(),
    })))
}

/// POST /api/v1/advertisements - create a listing
///
/// Requires authentication; the authenticated identity becomes the author.
pub async fn create_advertisement(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateAdvertisementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateAdvertisementInput {
        title: body.title,
        description: body.description,
        price: body.price,
        city_id: body.city_id,
        city_name: body.city_name,
        category_id: body.category_id,
        author_id: user.0.id,
        tag_ids: body.tag_ids,
        cover: body.cover,
    };

    let advertisement = state.advertisement_service.create(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "advertisement": advertisement })),
    ))
}

/// GET /api/v1/advertisements/:slug - detail view
///
/// Every fetch increments the listing's view counter.
pub async fn get_advertisement(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let advertisement = state.advertisement_service.get_detail(&slug).await?;

    Ok(Json(json!({ "advertisement": advertisement })))
}

/// PUT /api/v1/advertisements/:slug - update a listing (author only)
pub async fn update_advertisement(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
    Json(body): Json<UpdateAdvertisementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdateAdvertisementInput {
        title: body.title,
        description: body.description,
        price: body.price,
        city_id: body.city_id,
        city_name: body.city_name,
        category_id: body.category_id,
        tag_ids: body.tag_ids,
        cover: body.cover,
    };

    let advertisement = state
        .advertisement_service
        .update(&slug, user.0.id, input)
        .await?;

    Ok(Json(json!({ "advertisement": advertisement })))
}

/// DELETE /api/v1/advertisements/:slug - delete a listing (author only)
pub async fn delete_advertisement(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.advertisement_service.delete(&slug, user.0.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/advertisements/:slug/similar - up to 4 related listings
pub async fn similar_advertisements(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let advertisements = state.advertisement_service.similar(&slug).await?;

    Ok(Json(json!({ "advertisements": advertisements })))
}
