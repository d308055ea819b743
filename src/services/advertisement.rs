//! Advertisement service
//!
//! Implements business logic for listings:
//! - Create/update/delete with ownership checks (author only)
//! - City selection rule: exactly one of existing-city or new-city-name
//! - Slug assignment from the title via the shared utility
//! - Filtered, sorted, paginated listings with eager related rows
//! - Detail fetch with view-counter increment
//! - Similar-ads lookup
//! - Stored cover removal when a listing is deleted

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::db::repositories::{AdvertisementRepository, CategoryRepository, TagRepository};
use crate::models::{
    AdFilter, AdSort, Advertisement, AdvertisementWithMeta, CreateAdvertisementInput, ListParams,
    NewAdvertisement, PagedResult, Tag, UpdateAdvertisementInput,
};
use crate::services::city::CityService;
use crate::services::slug::assign_unique_slug;

/// How many similar advertisements a detail page shows
pub const SIMILAR_LIMIT: i64 = 4;

/// Error types for advertisement service operations
#[derive(Debug, thiserror::Error)]
pub enum AdvertisementServiceError {
    /// Advertisement not found
    #[error("Advertisement not found: {0}")]
    NotFound(String),

    /// Acting identity is not the author
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Advertisement service
pub struct AdvertisementService {
    repo: Arc<dyn AdvertisementRepository>,
    category_repo: Arc<dyn CategoryRepository>,
    tag_repo: Arc<dyn TagRepository>,
    city_service: Arc<CityService>,
    upload_dir: PathBuf,
}

impl AdvertisementService {
    pub fn new(
        repo: Arc<dyn AdvertisementRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        tag_repo: Arc<dyn TagRepository>,
        city_service: Arc<CityService>,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            repo,
            category_repo,
            tag_repo,
            city_service,
            upload_dir,
        }
    }

    /// Create a new advertisement.
    ///
    /// The city must be given either as an existing selection or a free-text
    /// name, never both and never neither; a new name creates or reuses a
    /// City record. The slug is derived from the title with collision
    /// suffixing and is fixed for the listing's lifetime.
    pub async fn create(
        &self,
        input: CreateAdvertisementInput,
    ) -> Result<Advertisement, AdvertisementServiceError> {
        self.validate_title(&input.title)?;
        self.validate_description(&input.description)?;
        self.validate_price(input.price)?;

        let city_id = self
            .resolve_city(input.city_id, input.city_name.as_deref())
            .await?
            .ok_or_else(|| {
                AdvertisementServiceError::ValidationError(
                    "Select an existing city or enter a new one (exactly one)".to_string(),
                )
            })?;

        if self
            .category_repo
            .get_by_id(input.category_id)
            .await
            .context("Failed to check category")?
            .is_none()
        {
            return Err(AdvertisementServiceError::ValidationError(format!(
                "Category {} does not exist",
                input.category_id
            )));
        }

        let slug = assign_unique_slug(self.repo.as_ref(), input.title.trim(), None).await?;

        let ad = self
            .repo
            .create(&NewAdvertisement {
                slug,
                title: input.title.trim().to_string(),
                description: input.description.trim().to_string(),
                price: input.price,
                city_id,
                category_id: input.category_id,
                author_id: input.author_id,
                cover: input.cover,
            })
            .await
            .context("Failed to create advertisement")?;

        if !input.tag_ids.is_empty() {
            self.tag_repo
                .set_for_advertisement(ad.id, &input.tag_ids)
                .await
                .context("Failed to attach tags")?;
        }

        Ok(ad)
    }

    /// Detail fetch by slug: bumps the view counter, then returns the
    /// listing with author/city/category/tags attached.
    pub async fn get_detail(
        &self,
        slug: &str,
    ) -> Result<AdvertisementWithMeta, AdvertisementServiceError> {
        let existing = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get advertisement")?
            .ok_or_else(|| AdvertisementServiceError::NotFound(slug.to_string()))?;

        self.repo
            .increment_views(existing.id)
            .await
            .context("Failed to increment views")?;

        let mut meta = self
            .repo
            .get_with_meta_by_slug(slug)
            .await
            .context("Failed to get advertisement")?
            .ok_or_else(|| AdvertisementServiceError::NotFound(slug.to_string()))?;

        meta.tags = self
            .tag_repo
            .get_for_advertisement(meta.advertisement.id)
            .await
            .context("Failed to get tags")?;

        Ok(meta)
    }

    /// List advertisements matching the filter, sorted and paginated.
    pub async fn list(
        &self,
        filter: &AdFilter,
        sort: AdSort,
        params: &ListParams,
    ) -> Result<PagedResult<AdvertisementWithMeta>, AdvertisementServiceError> {
        let mut items = self
            .repo
            .list(filter, sort, params.offset(), params.limit())
            .await
            .context("Failed to list advertisements")?;

        let total = self
            .repo
            .count(filter)
            .await
            .context("Failed to count advertisements")?;

        self.attach_tags(&mut items).await?;

        Ok(PagedResult::new(items, total, params))
    }

    /// Update an advertisement. Only the author may do this; the slug is
    /// never re-derived.
    pub async fn update(
        &self,
        slug: &str,
        acting_user_id: i64,
        mut input: UpdateAdvertisementInput,
    ) -> Result<Advertisement, AdvertisementServiceError> {
        let existing = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get advertisement")?
            .ok_or_else(|| AdvertisementServiceError::NotFound(slug.to_string()))?;

        if existing.author_id != acting_user_id {
            return Err(AdvertisementServiceError::Forbidden(
                "Only the author can edit this advertisement".to_string(),
            ));
        }

        if let Some(ref title) = input.title {
            self.validate_title(title)?;
        }
        if let Some(ref description) = input.description {
            self.validate_description(description)?;
        }
        if let Some(price) = input.price {
            self.validate_price(price)?;
        }

        if input.city_id.is_some() || input.city_name.is_some() {
            let city_id = self
                .resolve_city(input.city_id, input.city_name.as_deref())
                .await?
                .ok_or_else(|| {
                    AdvertisementServiceError::ValidationError(
                        "Select an existing city or enter a new one (exactly one)".to_string(),
                    )
                })?;
            input.city_id = Some(city_id);
            input.city_name = None;
        }

        if let Some(category_id) = input.category_id {
            if self
                .category_repo
                .get_by_id(category_id)
                .await
                .context("Failed to check category")?
                .is_none()
            {
                return Err(AdvertisementServiceError::ValidationError(format!(
                    "Category {} does not exist",
                    category_id
                )));
            }
        }

        let tag_ids = input.tag_ids.take();

        let updated = self
            .repo
            .update(existing.id, &input)
            .await
            .context("Failed to update advertisement")?;

        if let Some(ids) = tag_ids {
            self.tag_repo
                .set_for_advertisement(updated.id, &ids)
                .await
                .context("Failed to update tags")?;
        }

        Ok(updated)
    }

    /// Delete an advertisement. Only the author may do this. Responses and
    /// tag links cascade in the database; the stored cover file is removed
    /// afterwards, and a cover that is already gone is not an error.
    pub async fn delete(
        &self,
        slug: &str,
        acting_user_id: i64,
    ) -> Result<(), AdvertisementServiceError> {
        let existing = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get advertisement")?
            .ok_or_else(|| AdvertisementServiceError::NotFound(slug.to_string()))?;

        if existing.author_id != acting_user_id {
            return Err(AdvertisementServiceError::Forbidden(
                "Only the author can delete this advertisement".to_string(),
            ));
        }

        self.repo
            .delete(existing.id)
            .await
            .context("Failed to delete advertisement")?;

        if let Some(ref cover) = existing.cover {
            self.remove_cover_file(cover).await;
        }

        Ok(())
    }

    /// Up to four other advertisements sharing the category or any tag.
    pub async fn similar(
        &self,
        slug: &str,
    ) -> Result<Vec<AdvertisementWithMeta>, AdvertisementServiceError> {
        let existing = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get advertisement")?
            .ok_or_else(|| AdvertisementServiceError::NotFound(slug.to_string()))?;

        let mut items = self
            .repo
            .similar(existing.id, existing.category_id, SIMILAR_LIMIT)
            .await
            .context("Failed to find similar advertisements")?;

        self.attach_tags(&mut items).await?;

        Ok(items)
    }

    // ========================================================================
    // Private helpers
    // ========================================================================

    fn validate_title(&self, title: &str) -> Result<(), AdvertisementServiceError> {
        if title.trim().is_empty() {
            return Err(AdvertisementServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_description(&self, description: &str) -> Result<(), AdvertisementServiceError> {
        if description.trim().is_empty() {
            return Err(AdvertisementServiceError::ValidationError(
                "Description cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_price(&self, price: f64) -> Result<(), AdvertisementServiceError> {
        if !price.is_finite() || price < 0.0 {
            return Err(AdvertisementServiceError::ValidationError(
                "Price must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    /// Enforce the exactly-one rule on the two city form fields.
    ///
    /// Returns `Ok(None)` when neither or both are given (the caller turns
    /// that into a validation error), the resolved city id otherwise.
    async fn resolve_city(
        &self,
        city_id: Option<i64>,
        city_name: Option<&str>,
    ) -> Result<Option<i64>, AdvertisementServiceError> {
        let city_name = city_name.map(str::trim).filter(|n| !n.is_empty());

        match (city_id, city_name) {
            (Some(id), None) => {
                let city = self
                    .city_service
                    .get_by_id(id)
                    .await
                    .context("Failed to check city")?;
                match city {
                    Some(c) => Ok(Some(c.id)),
                    None => Err(AdvertisementServiceError::ValidationError(format!(
                        "City {} does not exist",
                        id
                    ))),
                }
            }
            (None, Some(name)) => {
                let city = self
                    .city_service
                    .get_or_create(name)
                    .await
                    .context("Failed to create city")?;
                Ok(Some(city.id))
            }
            _ => Ok(None),
        }
    }

    /// Fill tags for a page of listings with a single batched query.
    async fn attach_tags(
        &self,
        items: &mut [AdvertisementWithMeta],
    ) -> Result<(), AdvertisementServiceError> {
        if items.is_empty() {
            return Ok(());
        }

        let ids: Vec<i64> = items.iter().map(|m| m.advertisement.id).collect();
        let pairs = self
            .tag_repo
            .get_for_advertisements(&ids)
            .await
            .context("Failed to prefetch tags")?;

        let mut by_ad: HashMap<i64, Vec<Tag>> = HashMap::new();
        for (ad_id, tag) in pairs {
            by_ad.entry(ad_id).or_default().push(tag);
        }

        for item in items.iter_mut() {
            if let Some(tags) = by_ad.remove(&item.advertisement.id) {
                item.tags = tags;
            }
        }

        Ok(())
    }

    /// Remove the stored cover image; a file that is already gone is fine.
    async fn remove_cover_file(&self, cover: &str) {
        let Some(file_name) = Path::new(cover).file_name() else {
            return;
        };
        let path = self.upload_dir.join(file_name);

        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove cover file {:?}: {}", path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxAdvertisementRepository, SqlxCategoryRepository, SqlxCityRepository,
        SqlxTagRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use sqlx::SqlitePool;

    async fn setup_with_dir(upload_dir: PathBuf) -> (DynDatabasePool, AdvertisementService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let city_service = Arc::new(CityService::new(SqlxCityRepository::boxed(pool.clone())));
        let service = AdvertisementService::new(
            SqlxAdvertisementRepository::boxed(pool.clone()),
            SqlxCategoryRepository::boxed(pool.clone()),
            SqlxTagRepository::boxed(pool.clone()),
            city_service,
            upload_dir,
        );
        (pool, service)
    }

    async fn setup() -> (DynDatabasePool, AdvertisementService) {
        setup_with_dir(PathBuf::from("uploads")).await
    }

    async fn create_test_user(pool: &SqlitePool, username: &str) -> i64 {
        let result = sqlx::query("INSERT INTO users (username, email) VALUES (?, ?)")
            .bind(username)
            .bind(format!("{}@example.com", username))
            .execute(pool)
            .await
            .expect("Failed to create user");
        result.last_insert_rowid()
    }

    fn create_input(title: &str, author_id: i64) -> CreateAdvertisementInput {
        CreateAdvertisementInput {
            title: title.to_string(),
            description: format!("Описание {}", title),
            price: 100.0,
            city_id: Some(1),
            city_name: None,
            category_id: 1,
            author_id,
            tag_ids: Vec::new(),
            cover: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug() {
        let (pool, service) = setup().await;
        let author = create_test_user(pool.as_sqlite().unwrap(), "anna").await;

        let ad = service.create(create_input("Велосипед", author)).await.unwrap();
        assert_eq!(ad.slug, "velosiped");
    }

    #[tokio::test]
    async fn test_duplicate_titles_get_suffixed_slugs() {
        let (pool, service) = setup().await;
        let author = create_test_user(pool.as_sqlite().unwrap(), "anna").await;

        let first = service.create(create_input("Велосипед", author)).await.unwrap();
        let second = service.create(create_input("Велосипед", author)).await.unwrap();
        let third = service.create(create_input("Велосипед", author)).await.unwrap();

        assert_eq!(first.slug, "velosiped");
        assert_eq!(second.slug, "velosiped-1");
        assert_eq!(third.slug, "velosiped-2");
    }

    #[tokio::test]
    async fn test_city_xor_validation() {
        let (pool, service) = setup().await;
        let author = create_test_user(pool.as_sqlite().unwrap(), "anna").await;

        // Neither field filled
        let mut input = create_input("Стол", author);
        input.city_id = None;
        input.city_name = None;
        let result = service.create(input).await;
        assert!(matches!(
            result,
            Err(AdvertisementServiceError::ValidationError(_))
        ));

        // Both fields filled
        let mut input = create_input("Стол", author);
        input.city_id = Some(1);
        input.city_name = Some("Сочи".to_string());
        let result = service.create(input).await;
        assert!(matches!(
            result,
            Err(AdvertisementServiceError::ValidationError(_))
        ));

        // A blank name counts as absent
        let mut input = create_input("Стол", author);
        input.city_id = Some(1);
        input.city_name = Some("   ".to_string());
        assert!(service.create(input).await.is_ok());
    }

    #[tokio::test]
    async fn test_city_name_creates_or_reuses() {
        let (pool, service) = setup().await;
        let author = create_test_user(pool.as_sqlite().unwrap(), "anna").await;

        let mut input = create_input("Стол", author);
        input.city_id = None;
        input.city_name = Some("Сочи".to_string());
        let first = service.create(input).await.unwrap();

        let mut input = create_input("Стул", author);
        input.city_id = None;
        input.city_name = Some("Сочи".to_string());
        let second = service.create(input).await.unwrap();

        assert_eq!(first.city_id, second.city_id);
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let (pool, service) = setup().await;
        let author = create_test_user(pool.as_sqlite().unwrap(), "anna").await;

        let mut input = create_input("Стол", author);
        input.price = -5.0;
        let result = service.create(input).await;
        assert!(matches!(
            result,
            Err(AdvertisementServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_detail_increments_views() {
        let (pool, service) = setup().await;
        let author = create_test_user(pool.as_sqlite().unwrap(), "anna").await;

        service.create(create_input("Стол", author)).await.unwrap();

        let first = service.get_detail("stol").await.unwrap();
        assert_eq!(first.advertisement.views, 1);

        let second = service.get_detail("stol").await.unwrap();
        assert_eq!(second.advertisement.views, 2);
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let (_pool, service) = setup().await;

        let result = service.get_detail("no-such-ad").await;
        assert!(matches!(result, Err(AdvertisementServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_requires_ownership() {
        let (pool, service) = setup().await;
        let sqlite = pool.as_sqlite().unwrap();
        let anna = create_test_user(sqlite, "anna").await;
        let boris = create_test_user(sqlite, "boris").await;

        service.create(create_input("Стол", anna)).await.unwrap();

        let input = UpdateAdvertisementInput {
            title: Some("Чужой стол".to_string()),
            ..Default::default()
        };
        let result = service.update("stol", boris, input).await;
        assert!(matches!(result, Err(AdvertisementServiceError::Forbidden(_))));

        // The author can
        let input = UpdateAdvertisementInput {
            title: Some("Стол дубовый".to_string()),
            ..Default::default()
        };
        let updated = service.update("stol", anna, input).await.unwrap();
        assert_eq!(updated.title, "Стол дубовый");
        assert_eq!(updated.slug, "stol");
    }

    #[tokio::test]
    async fn test_delete_requires_ownership() {
        let (pool, service) = setup().await;
        let sqlite = pool.as_sqlite().unwrap();
        let anna = create_test_user(sqlite, "anna").await;
        let boris = create_test_user(sqlite, "boris").await;

        service.create(create_input("Стол", anna)).await.unwrap();

        let result = service.delete("stol", boris).await;
        assert!(matches!(result, Err(AdvertisementServiceError::Forbidden(_))));

        service.delete("stol", anna).await.unwrap();
        let result = service.get_detail("stol").await;
        assert!(matches!(result, Err(AdvertisementServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_cover_file() {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let (pool, service) = setup_with_dir(temp.path().to_path_buf()).await;
        let author = create_test_user(pool.as_sqlite().unwrap(), "anna").await;

        let cover_path = temp.path().join("cover.jpg");
        std::fs::write(&cover_path, b"jpeg bytes").unwrap();

        let mut input = create_input("Стол", author);
        input.cover = Some("/uploads/cover.jpg".to_string());
        service.create(input).await.unwrap();

        service.delete("stol", author).await.unwrap();
        assert!(!cover_path.exists());
    }

    #[tokio::test]
    async fn test_delete_without_cover_ok() {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let (pool, service) = setup_with_dir(temp.path().to_path_buf()).await;
        let author = create_test_user(pool.as_sqlite().unwrap(), "anna").await;

        // Cover recorded but the file never existed
        let mut input = create_input("Стол", author);
        input.cover = Some("/uploads/ghost.jpg".to_string());
        service.create(input).await.unwrap();
        service.delete("stol", author).await.unwrap();

        // No cover at all
        service.create(create_input("Стул", author)).await.unwrap();
        service.delete("stul", author).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_with_tags_attached() {
        let (pool, service) = setup().await;
        let author = create_test_user(pool.as_sqlite().unwrap(), "anna").await;

        let tag_repo = SqlxTagRepository::new(pool.clone());
        let tag = tag_repo.create("torg", "Торг", "#ff0000").await.unwrap();

        let mut input = create_input("Стол", author);
        input.tag_ids = vec![tag.id];
        service.create(input).await.unwrap();

        let page = service
            .list(&AdFilter::default(), AdSort::default(), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].tags.len(), 1);
        assert_eq!(page.items[0].tags[0].slug, "torg");
    }
}
