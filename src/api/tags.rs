//! Tag API endpoints
//!
//! - GET /api/v1/tags - tag index with usage counts
//! - POST /api/v1/tags - create a tag (any authenticated user)
//! - GET /api/v1/tags/:slug/advertisements - listings with a tag

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::common::{PaginationQuery, TAG_PAGE_SIZE};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{AdFilter, AdSort, ListParams};

/// Request body for creating a tag
#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: Option<String>,
}

/// GET /api/v1/tags
pub async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let tags = state.tag_service.list_with_counts().await?;

    Ok(Json(json!({ "tags": tags })))
}

/// POST /api/v1/tags
///
/// Requires authentication.
pub async fn create_tag(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(body): Json<CreateTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .tag_service
        .create(&body.name, body.color.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "tag": tag }))))
}

/// GET /api/v1/tags/:slug/advertisements
pub async fn tag_advertisements(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .tag_service
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Tag not found: {}", slug)))?;

    let filter = AdFilter {
        tag_slug: Some(tag.slug.clone()),
        ..Default::default()
    };
    let params = ListParams::new(query.page, TAG_PAGE_SIZE);

    let page = state
        .advertisement_service
        .list(&filter, AdSort::default(), &params)
        .await?;

    Ok(Json(json!({
        "tag": tag,
        "advertisements": page.items,
        "total": page.total,
        "page": page.page,
        "page_size": page.per_page,
        "total_pages": page.total_pages(),
    })))
}
