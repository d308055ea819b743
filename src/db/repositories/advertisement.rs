//! Advertisement repository
//!
//! Database operations for advertisements, including the listing query
//! engine: one joined query per page (users, cities, categories come along
//! eagerly), composed filters, and an allow-listed sort order.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{
    AdFilter, AdSort, Advertisement, AdvertisementWithMeta, NewAdvertisement,
    UpdateAdvertisementInput,
};
use crate::services::slug::SlugLookup;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Advertisement repository trait
#[async_trait]
pub trait AdvertisementRepository: SlugLookup {
    /// Create a new advertisement
    async fn create(&self, ad: &NewAdvertisement) -> Result<Advertisement>;

    /// Get advertisement by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Advertisement>>;

    /// Get advertisement by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Advertisement>>;

    /// Get advertisement by slug with author/city/category joined in
    async fn get_with_meta_by_slug(&self, slug: &str) -> Result<Option<AdvertisementWithMeta>>;

    /// List advertisements matching `filter`, ordered by `sort`.
    ///
    /// Related rows are joined eagerly; tags are prefetched separately in one
    /// batched query by the caller.
    async fn list(
        &self,
        filter: &AdFilter,
        sort: AdSort,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<AdvertisementWithMeta>>;

    /// Count advertisements matching `filter`
    async fn count(&self, filter: &AdFilter) -> Result<i64>;

    /// Update an advertisement. The slug is never touched.
    async fn update(&self, id: i64, input: &UpdateAdvertisementInput) -> Result<Advertisement>;

    /// Delete an advertisement (responses and tag links cascade)
    async fn delete(&self, id: i64) -> Result<()>;

    /// Atomically bump the view counter
    async fn increment_views(&self, id: i64) -> Result<()>;

    /// Up to `limit` other advertisements sharing the category or any tag,
    /// excluding the advertisement itself, deduplicated.
    async fn similar(
        &self,
        advertisement_id: i64,
        category_id: i64,
        limit: i64,
    ) -> Result<Vec<AdvertisementWithMeta>>;
}

/// SQLx-based advertisement repository implementation
pub struct SqlxAdvertisementRepository {
    pool: DynDatabasePool,
}

impl SqlxAdvertisementRepository {
    /// Create a new SQLx advertisement repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AdvertisementRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SlugLookup for SqlxAdvertisementRepository {
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                slug_exists_sqlite(self.pool.as_sqlite().unwrap(), slug, exclude_id).await
            }
            DatabaseDriver::Mysql => {
                slug_exists_mysql(self.pool.as_mysql().unwrap(), slug, exclude_id).await
            }
        }
    }
}

#[async_trait]
impl AdvertisementRepository for SqlxAdvertisementRepository {
    async fn create(&self, ad: &NewAdvertisement) -> Result<Advertisement> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), ad).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), ad).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Advertisement>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Advertisement>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await,
            DatabaseDriver::Mysql => get_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await,
        }
    }

    async fn get_with_meta_by_slug(&self, slug: &str) -> Result<Option<AdvertisementWithMeta>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_with_meta_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_with_meta_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn list(
        &self,
        filter: &AdFilter,
        sort: AdSort,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<AdvertisementWithMeta>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_sqlite(self.pool.as_sqlite().unwrap(), filter, sort, offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_mysql(self.pool.as_mysql().unwrap(), filter, sort, offset, limit).await
            }
        }
    }

    async fn count(&self, filter: &AdFilter) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_sqlite(self.pool.as_sqlite().unwrap(), filter).await,
            DatabaseDriver::Mysql => count_mysql(self.pool.as_mysql().unwrap(), filter).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdateAdvertisementInput) -> Result<Advertisement> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), id, input).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), id, input).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn increment_views(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                increment_views_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => increment_views_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn similar(
        &self,
        advertisement_id: i64,
        category_id: i64,
        limit: i64,
    ) -> Result<Vec<AdvertisementWithMeta>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                similar_sqlite(self.pool.as_sqlite().unwrap(), advertisement_id, category_id, limit)
                    .await
            }
            DatabaseDriver::Mysql => {
                similar_mysql(self.pool.as_mysql().unwrap(), advertisement_id, category_id, limit)
                    .await
            }
        }
    }
}

// ============================================================================
// Shared SQL construction
// ============================================================================

/// Base SELECT with the eager joins every meta query shares
const SELECT_META: &str = "\
    SELECT a.id, a.slug, a.title, a.description, a.price, a.city_id, a.category_id, \
           a.author_id, a.cover, a.views, a.created_at, a.updated_at, \
           u.username AS author_username, \
           c.name AS city_name, c.slug AS city_slug, \
           cat.name AS category_name, cat.slug AS category_slug \
    FROM advertisements a \
    INNER JOIN users u ON u.id = a.author_id \
    INNER JOIN cities c ON c.id = a.city_id \
    INNER JOIN categories cat ON cat.id = a.category_id";

const COUNT_META: &str = "\
    SELECT COUNT(*) as count \
    FROM advertisements a \
    INNER JOIN users u ON u.id = a.author_id \
    INNER JOIN cities c ON c.id = a.city_id \
    INNER JOIN categories cat ON cat.id = a.category_id";

/// Build the WHERE clause for a filter.
///
/// Bind order must match: category slug, city slug, tag slug, query pattern
/// (twice), author id, author username.
fn build_where(filter: &AdFilter) -> String {
    let mut conds: Vec<&'static str> = Vec::new();

    if filter.category_slug.is_some() {
        conds.push("cat.slug = ?");
    }
    if filter.city_slug.is_some() {
        conds.push("c.slug = ?");
    }
    if filter.tag_slug.is_some() {
        conds.push(
            "a.id IN (SELECT at.advertisement_id FROM advertisement_tags at \
             INNER JOIN tags t ON t.id = at.tag_id WHERE t.slug = ?)",
        );
    }
    if filter.query.is_some() {
        conds.push("(LOWER(a.title) LIKE LOWER(?) OR LOWER(a.description) LIKE LOWER(?))");
    }
    if filter.author_id.is_some() {
        conds.push("a.author_id = ?");
    }
    if filter.author_username.is_some() {
        conds.push("LOWER(u.username) = ?");
    }

    if conds.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conds.join(" AND "))
    }
}

fn list_sql(filter: &AdFilter, sort: AdSort) -> String {
    format!(
        "{}{} ORDER BY {}, a.id DESC LIMIT ? OFFSET ?",
        SELECT_META,
        build_where(filter),
        sort.order_clause()
    )
}

fn count_sql(filter: &AdFilter) -> String {
    format!("{}{}", COUNT_META, build_where(filter))
}

const SIMILAR_SQL_TAIL: &str = " WHERE a.id != ? AND (a.category_id = ? OR a.id IN (\
    SELECT advertisement_id FROM advertisement_tags WHERE tag_id IN (\
    SELECT tag_id FROM advertisement_tags WHERE advertisement_id = ?))) \
    ORDER BY a.created_at DESC, a.id DESC LIMIT ?";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, ad: &NewAdvertisement) -> Result<Advertisement> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO advertisements (slug, title, description, price, city_id, category_id, author_id, cover, views, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&ad.slug)
    .bind(&ad.title)
    .bind(&ad.description)
    .bind(ad.price)
    .bind(ad.city_id)
    .bind(ad.category_id)
    .bind(ad.author_id)
    .bind(&ad.cover)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create advertisement")?;

    let id = result.last_insert_rowid();

    Ok(Advertisement {
        id,
        slug: ad.slug.clone(),
        title: ad.title.clone(),
        description: ad.description.clone(),
        price: ad.price,
        city_id: ad.city_id,
        category_id: ad.category_id,
        author_id: ad.author_id,
        cover: ad.cover.clone(),
        views: 0,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Advertisement>> {
    let row = sqlx::query(
        "SELECT id, slug, title, description, price, city_id, category_id, author_id, cover, views, created_at, updated_at \
         FROM advertisements WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get advertisement by ID")?;

    Ok(row.map(|row| row_to_ad_sqlite(&row)))
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Advertisement>> {
    let row = sqlx::query(
        "SELECT id, slug, title, description, price, city_id, category_id, author_id, cover, views, created_at, updated_at \
         FROM advertisements WHERE slug = ?",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get advertisement by slug")?;

    Ok(row.map(|row| row_to_ad_sqlite(&row)))
}

async fn get_with_meta_by_slug_sqlite(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Option<AdvertisementWithMeta>> {
    let sql = format!("{} WHERE a.slug = ?", SELECT_META);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get advertisement with meta")?;

    Ok(row.map(|row| row_to_meta_sqlite(&row)))
}

async fn list_sqlite(
    pool: &SqlitePool,
    filter: &AdFilter,
    sort: AdSort,
    offset: i64,
    limit: i64,
) -> Result<Vec<AdvertisementWithMeta>> {
    let sql = list_sql(filter, sort);

    let mut query = sqlx::query(&sql);
    if let Some(ref s) = filter.category_slug {
        query = query.bind(s.clone());
    }
    if let Some(ref s) = filter.city_slug {
        query = query.bind(s.clone());
    }
    if let Some(ref s) = filter.tag_slug {
        query = query.bind(s.clone());
    }
    if let Some(ref s) = filter.query {
        let pattern = format!("%{}%", s);
        query = query.bind(pattern.clone()).bind(pattern);
    }
    if let Some(id) = filter.author_id {
        query = query.bind(id);
    }
    if let Some(ref s) = filter.author_username {
        query = query.bind(s.to_lowercase());
    }
    query = query.bind(limit).bind(offset);

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list advertisements")?;

    Ok(rows.iter().map(row_to_meta_sqlite).collect())
}

async fn count_sqlite(pool: &SqlitePool, filter: &AdFilter) -> Result<i64> {
    let sql = count_sql(filter);

    let mut query = sqlx::query(&sql);
    if let Some(ref s) = filter.category_slug {
        query = query.bind(s.clone());
    }
    if let Some(ref s) = filter.city_slug {
        query = query.bind(s.clone());
    }
    if let Some(ref s) = filter.tag_slug {
        query = query.bind(s.clone());
    }
    if let Some(ref s) = filter.query {
        let pattern = format!("%{}%", s);
        query = query.bind(pattern.clone()).bind(pattern);
    }
    if let Some(id) = filter.author_id {
        query = query.bind(id);
    }
    if let Some(ref s) = filter.author_username {
        query = query.bind(s.to_lowercase());
    }

    let row = query
        .fetch_one(pool)
        .await
        .context("Failed to count advertisements")?;

    Ok(row.get("count"))
}

async fn update_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateAdvertisementInput,
) -> Result<Advertisement> {
    let existing = get_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Advertisement not found"))?;

    let now = Utc::now();
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_description = input.description.as_ref().unwrap_or(&existing.description);
    let new_price = input.price.unwrap_or(existing.price);
    let new_city_id = input.city_id.unwrap_or(existing.city_id);
    let new_category_id = input.category_id.unwrap_or(existing.category_id);
    let new_cover = input.cover.clone().or(existing.cover.clone());

    sqlx::query(
        r#"
        UPDATE advertisements
        SET title = ?, description = ?, price = ?, city_id = ?, category_id = ?, cover = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_title)
    .bind(new_description)
    .bind(new_price)
    .bind(new_city_id)
    .bind(new_category_id)
    .bind(&new_cover)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update advertisement")?;

    get_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Advertisement not found after update"))
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    // responses and advertisement_tags rows go with it via ON DELETE CASCADE
    sqlx::query("DELETE FROM advertisements WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete advertisement")?;

    Ok(())
}

async fn increment_views_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE advertisements SET views = views + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment views")?;

    Ok(())
}

async fn similar_sqlite(
    pool: &SqlitePool,
    advertisement_id: i64,
    category_id: i64,
    limit: i64,
) -> Result<Vec<AdvertisementWithMeta>> {
    let sql = format!("{}{}", SELECT_META, SIMILAR_SQL_TAIL);

    let rows = sqlx::query(&sql)
        .bind(advertisement_id)
        .bind(category_id)
        .bind(advertisement_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to find similar advertisements")?;

    Ok(rows.iter().map(row_to_meta_sqlite).collect())
}

async fn slug_exists_sqlite(pool: &SqlitePool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = match exclude_id {
        Some(id) => {
            sqlx::query("SELECT COUNT(*) as count FROM advertisements WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM advertisements WHERE slug = ?")
                .bind(slug)
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to check advertisement slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_ad_sqlite(row: &sqlx::sqlite::SqliteRow) -> Advertisement {
    Advertisement {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        price: row.get("price"),
        city_id: row.get("city_id"),
        category_id: row.get("category_id"),
        author_id: row.get("author_id"),
        cover: row.get("cover"),
        views: row.get("views"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_meta_sqlite(row: &sqlx::sqlite::SqliteRow) -> AdvertisementWithMeta {
    AdvertisementWithMeta {
        advertisement: row_to_ad_sqlite(row),
        author_username: row.get("author_username"),
        city_name: row.get("city_name"),
        city_slug: row.get("city_slug"),
        category_name: row.get("category_name"),
        category_slug: row.get("category_slug"),
        tags: Vec::new(),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, ad: &NewAdvertisement) -> Result<Advertisement> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO advertisements (slug, title, description, price, city_id, category_id, author_id, cover, views, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&ad.slug)
    .bind(&ad.title)
    .bind(&ad.description)
    .bind(ad.price)
    .bind(ad.city_id)
    .bind(ad.category_id)
    .bind(ad.author_id)
    .bind(&ad.cover)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create advertisement")?;

    let id = result.last_insert_id() as i64;

    Ok(Advertisement {
        id,
        slug: ad.slug.clone(),
        title: ad.title.clone(),
        description: ad.description.clone(),
        price: ad.price,
        city_id: ad.city_id,
        category_id: ad.category_id,
        author_id: ad.author_id,
        cover: ad.cover.clone(),
        views: 0,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Advertisement>> {
    let row = sqlx::query(
        "SELECT id, slug, title, description, price, city_id, category_id, author_id, cover, views, created_at, updated_at \
         FROM advertisements WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get advertisement by ID")?;

    Ok(row.map(|row| row_to_ad_mysql(&row)))
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Advertisement>> {
    let row = sqlx::query(
        "SELECT id, slug, title, description, price, city_id, category_id, author_id, cover, views, created_at, updated_at \
         FROM advertisements WHERE slug = ?",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get advertisement by slug")?;

    Ok(row.map(|row| row_to_ad_mysql(&row)))
}

async fn get_with_meta_by_slug_mysql(
    pool: &MySqlPool,
    slug: &str,
) -> Result<Option<AdvertisementWithMeta>> {
    let sql = format!("{} WHERE a.slug = ?", SELECT_META);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get advertisement with meta")?;

    Ok(row.map(|row| row_to_meta_mysql(&row)))
}

async fn list_mysql(
    pool: &MySqlPool,
    filter: &AdFilter,
    sort: AdSort,
    offset: i64,
    limit: i64,
) -> Result<Vec<AdvertisementWithMeta>> {
    let sql = list_sql(filter, sort);

    let mut query = sqlx::query(&sql);
    if let Some(ref s) = filter.category_slug {
        query = query.bind(s.clone());
    }
    if let Some(ref s) = filter.city_slug {
        query = query.bind(s.clone());
    }
    if let Some(ref s) = filter.tag_slug {
        query = query.bind(s.clone());
    }
    if let Some(ref s) = filter.query {
        let pattern = format!("%{}%", s);
        query = query.bind(pattern.clone()).bind(pattern);
    }
    if let Some(id) = filter.author_id {
        query = query.bind(id);
    }
    if let Some(ref s) = filter.author_username {
        query = query.bind(s.to_lowercase());
    }
    query = query.bind(limit).bind(offset);

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list advertisements")?;

    Ok(rows.iter().map(row_to_meta_mysql).collect())
}

async fn count_mysql(pool: &MySqlPool, filter: &AdFilter) -> Result<i64> {
    let sql = count_sql(filter);

    let mut query = sqlx::query(&sql);
    if let Some(ref s) = filter.category_slug {
        query = query.bind(s.clone());
    }
    if let Some(ref s) = filter.city_slug {
        query = query.bind(s.clone());
    }
    if let Some(ref s) = filter.tag_slug {
        query = query.bind(s.clone());
    }
    if let Some(ref s) = filter.query {
        let pattern = format!("%{}%", s);
        query = query.bind(pattern.clone()).bind(pattern);
    }
    if let Some(id) = filter.author_id {
        query = query.bind(id);
    }
    if let Some(ref s) = filter.author_username {
        query = query.bind(s.to_lowercase());
    }

    let row = query
        .fetch_one(pool)
        .await
        .context("Failed to count advertisements")?;

    Ok(row.get("count"))
}

async fn update_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateAdvertisementInput,
) -> Result<Advertisement> {
    let existing = get_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Advertisement not found"))?;

    let now = Utc::now();
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_description = input.description.as_ref().unwrap_or(&existing.description);
    let new_price = input.price.unwrap_or(existing.price);
    let new_city_id = input.city_id.unwrap_or(existing.city_id);
    let new_category_id = input.category_id.unwrap_or(existing.category_id);
    let new_cover = input.cover.clone().or(existing.cover.clone());

    sqlx::query(
        r#"
        UPDATE advertisements
        SET title = ?, description = ?, price = ?, city_id = ?, category_id = ?, cover = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_title)
    .bind(new_description)
    .bind(new_price)
    .bind(new_city_id)
    .bind(new_category_id)
    .bind(&new_cover)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update advertisement")?;

    get_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Advertisement not found after update"))
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM advertisements WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete advertisement")?;

    Ok(())
}

async fn increment_views_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("UPDATE advertisements SET views = views + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment views")?;

    Ok(())
}

async fn similar_mysql(
    pool: &MySqlPool,
    advertisement_id: i64,
    category_id: i64,
    limit: i64,
) -> Result<Vec<AdvertisementWithMeta>> {
    let sql = format!("{}{}", SELECT_META, SIMILAR_SQL_TAIL);

    let rows = sqlx::query(&sql)
        .bind(advertisement_id)
        .bind(category_id)
        .bind(advertisement_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to find similar advertisements")?;

    Ok(rows.iter().map(row_to_meta_mysql).collect())
}

async fn slug_exists_mysql(pool: &MySqlPool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = match exclude_id {
        Some(id) => {
            sqlx::query("SELECT COUNT(*) as count FROM advertisements WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM advertisements WHERE slug = ?")
                .bind(slug)
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to check advertisement slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_ad_mysql(row: &sqlx::mysql::MySqlRow) -> Advertisement {
    Advertisement {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        price: row.get("price"),
        city_id: row.get("city_id"),
        category_id: row.get("category_id"),
        author_id: row.get("author_id"),
        cover: row.get("cover"),
        views: row.get("views"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_meta_mysql(row: &sqlx::mysql::MySqlRow) -> AdvertisementWithMeta {
    AdvertisementWithMeta {
        advertisement: row_to_ad_mysql(row),
        author_username: row.get("author_username"),
        city_name: row.get("city_name"),
        city_slug: row.get("city_slug"),
        category_name: row.get("category_name"),
        category_slug: row.get("category_slug"),
        tags: Vec::new(),
    }
}
