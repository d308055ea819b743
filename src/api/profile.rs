//! Profile API endpoint
//!
//! GET /api/v1/profile/:username - a user's listings, plus their sent and
//! received responses when (and only when) the viewer is the profile owner.
//! Response lists stay participant-only even on profile pages.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::api::common::{default_page_size, PaginationQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{AdFilter, AdSort, ListParams};

/// GET /api/v1/profile/:username
pub async fn get_profile(
    State(state): State<AppState>,
    viewer: AuthenticatedUser,
    Path(username): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let profile_user = state
        .user_service
        .find_by_username(&username)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", username)))?;

    let filter = AdFilter {
        author_id: Some(profile_user.id),
        ..Default::default()
    };
    let params = ListParams::new(query.page, default_page_size());

    let advertisements = state
        .advertisement_service
        .list(&filter, AdSort::default(), &params)
        .await?;

    let mut body = json!({
        "profile_user": profile_user,
        "advertisements": advertisements.items,
        "total": advertisements.total,
        "page": advertisements.page,
        "total_pages": advertisements.total_pages(),
    });

    if viewer.0.id == profile_user.id {
        let received = state.response_service.received(profile_user.id).await?;
        let sent = state.response_service.sent(profile_user.id).await?;
        body["received_responses"] = json!(received);
        body["sent_responses"] = json!(sent);
    }

    Ok(Json(body))
}
