//! Response API endpoints
//!
//! Handles the response workflow over HTTP:
//! - POST /api/v1/advertisements/:slug/responses - submit a response
//! - GET /api/v1/responses/:id - detail (participants only)
//! - POST /api/v1/responses/:id/accept - accept (recipient only)
//! - POST /api/v1/responses/:id/reject - reject (recipient only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};

/// Request body for submitting a response
#[derive(Debug, Deserialize)]
pub struct CreateResponseRequest {
    pub text: String,
}

/// POST /api/v1/advertisements/:slug/responses
pub async fn create_response(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
    Json(body): Json<CreateResponseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .response_service
        .create(&slug, user.0.id, &body.text)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "response": response }))))
}

/// GET /api/v1/responses/:id
///
/// Visible only to the sender and the recipient; anyone else gets not-found.
pub async fn get_response(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.response_service.get(id, user.0.id).await?;

    Ok(Json(json!({ "response": response })))
}

/// POST /api/v1/responses/:id/accept
pub async fn accept_response(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.response_service.accept(id, user.0.id).await?;

    Ok(Json(json!({ "response": response })))
}

/// POST /api/v1/responses/:id/reject
pub async fn reject_response(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.response_service.reject(id, user.0.id).await?;

    Ok(Json(json!({ "response": response })))
}
