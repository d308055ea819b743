//! City service

use std::sync::Arc;

use anyhow::{ensure, Context, Result};

use crate::db::repositories::CityRepository;
use crate::models::City;
use crate::services::slug::assign_unique_slug;

/// City service
pub struct CityService {
    repo: Arc<dyn CityRepository>,
}

impl CityService {
    pub fn new(repo: Arc<dyn CityRepository>) -> Self {
        Self { repo }
    }

    /// List all cities
    pub async fn list(&self) -> Result<Vec<City>> {
        self.repo.list().await.context("Failed to list cities")
    }

    /// Get city by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<City>> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get city")
    }

    /// Get city by id
    pub async fn get_by_id(&self, id: i64) -> Result<Option<City>> {
        self.repo.get_by_id(id).await.context("Failed to get city")
    }

    /// Find a city by exact name, creating it (with a fresh unique slug)
    /// when no such city exists yet.
    pub async fn get_or_create(&self, name: &str) -> Result<City> {
        let name = name.trim();
        ensure!(!name.is_empty(), "City name cannot be empty");

        if let Some(existing) = self
            .repo
            .get_by_name(name)
            .await
            .context("Failed to look up city by name")?
        {
            return Ok(existing);
        }

        let slug = assign_unique_slug(self.repo.as_ref(), name, None).await?;
        self.repo
            .create(&slug, name)
            .await
            .context("Failed to create city")
    }
}
