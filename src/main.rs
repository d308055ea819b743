//! Adboard - A lightweight classifieds marketplace backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adboard::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxAdvertisementRepository, SqlxCategoryRepository, SqlxCityRepository,
            SqlxResponseRepository, SqlxSessionRepository, SqlxTagRepository, SqlxUserRepository,
        },
    },
    services::{
        AdvertisementService, CategoryService, CityService, ResponseService, TagService,
        UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adboard=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting adboard...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations (seed categories and cities ride along)
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let city_repo = SqlxCityRepository::boxed(pool.clone());
    let category_repo = SqlxCategoryRepository::boxed(pool.clone());
    let tag_repo = SqlxTagRepository::boxed(pool.clone());
    let advertisement_repo = SqlxAdvertisementRepository::boxed(pool.clone());
    let response_repo = SqlxResponseRepository::boxed(pool.clone());

    // Initialize services
    let user_service = Arc::new(UserService::new(user_repo, session_repo));
    let city_service = Arc::new(CityService::new(city_repo));
    let category_service = Arc::new(CategoryService::new(category_repo.clone()));
    let tag_service = Arc::new(TagService::new(tag_repo.clone()));
    let advertisement_service = Arc::new(AdvertisementService::new(
        advertisement_repo.clone(),
        category_repo,
        tag_repo,
        city_service.clone(),
        config.upload.path.clone(),
    ));
    let response_service = Arc::new(ResponseService::new(response_repo, advertisement_repo));

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        user_service,
        advertisement_service,
        response_service,
        city_service,
        category_service,
        tag_service,
        upload_config: Arc::new(config.upload.clone()),
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
