//! Category service
//!
//! Categories arrive via seed data; this service exposes browsing plus a
//! create path for loaders. Creation runs through the shared slug utility,
//! so category slugs get the same collision suffixing as every other entity.

use std::sync::Arc;

use anyhow::Context;

use crate::db::repositories::CategoryRepository;
use crate::models::Category;
use crate::services::slug::assign_unique_slug;

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Category not found
    #[error("Category not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Category service
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    /// List all categories
    pub async fn list(&self) -> Result<Vec<Category>, CategoryServiceError> {
        self.repo
            .list()
            .await
            .context("Failed to list categories")
            .map_err(Into::into)
    }

    /// Get category by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, CategoryServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get category")
            .map_err(Into::into)
    }

    /// Get category by id
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Category>, CategoryServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get category")
            .map_err(Into::into)
    }

    /// Create a new category
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, CategoryServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Category name cannot be empty".to_string(),
            ));
        }

        let slug = assign_unique_slug(self.repo.as_ref(), name, None).await?;

        self.repo
            .create(&slug, name, description)
            .await
            .context("Failed to create category")
            .map_err(Into::into)
    }
}
