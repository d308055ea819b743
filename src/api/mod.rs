//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the adboard system:
//! - Advertisement endpoints (index, CRUD, similar listings)
//! - Response workflow endpoints
//! - Category/City/Tag browsing and tag creation
//! - Profile endpoint
//! - Cover image upload and static serving of uploaded files

pub mod advertisements;
pub mod categories;
pub mod cities;
pub mod common;
pub mod middleware;
pub mod profile;
pub mod responses;
pub mod tags;
pub mod upload;


use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need auth)
    let protected_routes = Router::new()
        .route("/advertisements", post(advertisements::create_advertisement))
        .route("/advertisements/my", get(advertisements::my_advertisements))
        .route("/advertisements/{slug}", put(advertisements::update_advertisement))
        .route("/advertisements/{slug}", delete(advertisements::delete_advertisement))
        .route("/advertisements/{slug}/responses", post(responses::create_response))
        .route("/responses/{id}", get(responses::get_response))
        .route("/responses/{id}/accept", post(responses::accept_response))
        .route("/responses/{id}/reject", post(responses::reject_response))
        .route("/tags", post(tags::create_tag))
        .route("/profile/{username}", get(profile::get_profile))
        .route("/upload/image", post(upload::upload_image))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .route("/advertisements", get(advertisements::list_advertisements))
        .route("/advertisements/admin", get(advertisements::admin_advertisements))
        .route("/advertisements/{slug}", get(advertisements::get_advertisement))
        .route("/advertisements/{slug}/similar", get(advertisements::similar_advertisements))
        .nest("/categories", categories::router())
        .nest("/cities", cities::router())
        .route("/tags", get(tags::list_tags))
        .route("/tags/{slug}/advertisements", get(tags::tag_advertisements))
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    let uploads_dir = state.upload_config.path.clone();

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        // Uploaded cover images are served straight from disk
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
