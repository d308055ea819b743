//! Tag service
//!
//! Implements business logic for tag management:
//! - Tag creation by any authenticated user, with color validation
//! - Name uniqueness
//! - Tag index with usage counts

use std::sync::Arc;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::db::repositories::TagRepository;
use crate::models::{Tag, TagWithCount};
use crate::services::slug::assign_unique_slug;

/// `#rgb` or `#rrggbb`
static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap());

/// Color used when the form leaves the field blank
const DEFAULT_COLOR: &str = "#777777";

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    /// Tag name already exists
    #[error("Tag name already exists: {0}")]
    DuplicateName(String),

    /// Tag not found
    #[error("Tag not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Tag service
pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    /// Create a new tag
    pub async fn create(
        &self,
        name: &str,
        color: Option<&str>,
    ) -> Result<Tag, TagServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TagServiceError::ValidationError(
                "Tag name cannot be empty".to_string(),
            ));
        }

        let color = match color.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) if HEX_COLOR.is_match(c) => c.to_string(),
            Some(c) => {
                return Err(TagServiceError::ValidationError(format!(
                    "Invalid color '{}': expected a hex value like #ff8800",
                    c
                )));
            }
            None => DEFAULT_COLOR.to_string(),
        };

        if self
            .repo
            .exists_by_name(name)
            .await
            .context("Failed to check tag name uniqueness")?
        {
            return Err(TagServiceError::DuplicateName(name.to_string()));
        }

        let slug = assign_unique_slug(self.repo.as_ref(), name, None).await?;

        self.repo
            .create(&slug, name, &color)
            .await
            .context("Failed to create tag")
            .map_err(Into::into)
    }

    /// Get tag by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>, TagServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get tag")
            .map_err(Into::into)
    }

    /// List all tags with usage counts, most used first
    pub async fn list_with_counts(&self) -> Result<Vec<TagWithCount>, TagServiceError> {
        self.repo
            .list_with_counts()
            .await
            .context("Failed to list tags")
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxTagRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> TagService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        TagService::new(SqlxTagRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_create_tag() {
        let service = setup().await;

        let tag = service.create("Срочно", Some("#ff0000")).await.unwrap();
        assert_eq!(tag.slug, "srochno");
        assert_eq!(tag.color, "#ff0000");
    }

    #[tokio::test]
    async fn test_create_tag_default_color() {
        let service = setup().await;

        let tag = service.create("Обмен", None).await.unwrap();
        assert_eq!(tag.color, DEFAULT_COLOR);

        let tag = service.create("Торг", Some("  ")).await.unwrap();
        assert_eq!(tag.color, DEFAULT_COLOR);
    }

    #[tokio::test]
    async fn test_create_tag_invalid_color_fails() {
        let service = setup().await;

        for bad in ["red", "#12", "#12345", "ff0000", "#gg0000"] {
            let result = service.create("Срочно", Some(bad)).await;
            assert!(
                matches!(result, Err(TagServiceError::ValidationError(_))),
                "color '{}' should be rejected",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_create_duplicate_name_fails() {
        let service = setup().await;

        service.create("Срочно", None).await.unwrap();
        let result = service.create("Срочно", None).await;
        assert!(matches!(result, Err(TagServiceError::DuplicateName(_))));
    }

    #[tokio::test]
    async fn test_slug_collision_suffixed() {
        let service = setup().await;

        // Distinct names can still collide on the derived slug
        service.create("Torg", None).await.unwrap();
        let second = service.create("Торг", None).await.unwrap();
        assert_eq!(second.slug, "torg-1");
    }

    #[tokio::test]
    async fn test_empty_name_fails() {
        let service = setup().await;

        let result = service.create("   ", None).await;
        assert!(matches!(result, Err(TagServiceError::ValidationError(_))));
    }
}
