//! Tag repository
//!
//! Database operations for tags and their advertisement associations.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Tag, TagWithCount};
use crate::services::slug::SlugLookup;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: SlugLookup {
    /// Create a new tag
    async fn create(&self, slug: &str, name: &str, color: &str) -> Result<Tag>;

    /// Get tag by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    /// Get tag by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    /// Check if a tag with this exact name exists
    async fn exists_by_name(&self, name: &str) -> Result<bool>;

    /// List all tags with their advertisement counts, most used first
    async fn list_with_counts(&self) -> Result<Vec<TagWithCount>>;

    /// Replace the tag set of an advertisement
    async fn set_for_advertisement(&self, advertisement_id: i64, tag_ids: &[i64]) -> Result<()>;

    /// Get tags attached to one advertisement
    async fn get_for_advertisement(&self, advertisement_id: i64) -> Result<Vec<Tag>>;

    /// Get tags for a batch of advertisements as (advertisement_id, tag) pairs.
    ///
    /// This is the prefetch behind listing pages: one query per page, not one
    /// per row.
    async fn get_for_advertisements(&self, advertisement_ids: &[i64]) -> Result<Vec<(i64, Tag)>>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SlugLookup for SqlxTagRepository {
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
impl TagRepository for SqlxTagRepository {
    async fn create(&self, slug: &str, name: &str, color: &str) -> Result<Tag> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_tag_sqlite(self.pool.as_sqlite().unwrap(), slug, name, color).await
            }
            DatabaseDriver::Mysql => {
                create_tag_mysql(self.pool.as_mysql().unwrap(), slug, name, color).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_tag_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_tag_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_tag_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_tag_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_by_name_sqlite(self.pool.as_sqlite().unwrap(), name).await
            }
            DatabaseDriver::Mysql => exists_by_name_mysql(self.pool.as_mysql().unwrap(), name).await,
        }
    }

    async fn list_with_counts(&self) -> Result<Vec<TagWithCount>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_with_counts_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_with_counts_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn set_for_advertisement(&self, advertisement_id: i64, tag_ids: &[i64]) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_for_advertisement_sqlite(self.pool.as_sqlite().unwrap(), advertisement_id, tag_ids)
                    .await
            }
            DatabaseDriver::Mysql => {
                set_for_advertisement_mysql(self.pool.as_mysql().unwrap(), advertisement_id, tag_ids)
                    .await
            }
        }
    }

    async fn get_for_advertisement(&self, advertisement_id: i64) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_for_advertisement_sqlite(self.pool.as_sqlite().unwrap(), advertisement_id).await
            }
            DatabaseDriver::Mysql => {
                get_for_advertisement_mysql(self.pool.as_mysql().unwrap(), advertisement_id).await
            }
        }
    }

    async fn get_for_advertisements(&self, advertisement_ids: &[i64]) -> Result<Vec<(i64, Tag)>> {
        if advertisement_ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_for_advertisements_sqlite(self.pool.as_sqlite().unwrap(), advertisement_ids).await
            }
            DatabaseDriver::Mysql => {
                get_for_advertisements_mysql(self.pool.as_mysql().unwrap(), advertisement_ids).await
            }
        }
    }
}

/// Build an `(?, ?, ...)` placeholder list for IN clauses
fn placeholders(count: usize) -> String {
    let mut s = String::with_capacity(count * 3);
    for i in 0..count {
        if i > 0 {
            s.push_str(", ");
        }
        s.push('?');
    }
    s
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_tag_sqlite(pool: &SqlitePool, slug: &str, name: &str, color: &str) -> Result<Tag> {
    let result = sqlx::query("INSERT INTO tags (slug, name, color) VALUES (?, ?, ?)")
        .bind(slug)
        .bind(name)
        .bind(color)
        .execute(pool)
        .await
        .context("Failed to create tag")?;

    let id = result.last_insert_rowid();

    get_tag_by_id_sqlite(pool, id)
        .await?
        .context("Tag not found after insert")
}

async fn get_tag_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, slug, name, color, created_at FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by ID")?;

    Ok(row.map(|row| row_to_tag_sqlite(&row)))
}

async fn get_tag_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, slug, name, color, created_at FROM tags WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by slug")?;

    Ok(row.map(|row| row_to_tag_sqlite(&row)))
}

async fn exists_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM tags WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .context("Failed to check tag name existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn list_with_counts_sqlite(pool: &SqlitePool) -> Result<Vec<TagWithCount>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.slug, t.name, t.color, t.created_at, COUNT(at.advertisement_id) as advertisement_count
        FROM tags t
        LEFT JOIN advertisement_tags at ON at.tag_id = t.id
        GROUP BY t.id
        ORDER BY advertisement_count DESC, t.name ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list tags with counts")?;

    Ok(rows
        .iter()
        .map(|row| TagWithCount {
            tag: row_to_tag_sqlite(row),
            advertisement_count: row.get("advertisement_count"),
        })
        .collect())
}

async fn set_for_advertisement_sqlite(
    pool: &SqlitePool,
    advertisement_id: i64,
    tag_ids: &[i64],
) -> Result<()> {
    sqlx::query("DELETE FROM advertisement_tags WHERE advertisement_id = ?")
        .bind(advertisement_id)
        .execute(pool)
        .await
        .context("Failed to clear advertisement tags")?;

    for tag_id in tag_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO advertisement_tags (advertisement_id, tag_id) VALUES (?, ?)",
        )
        .bind(advertisement_id)
        .bind(tag_id)
        .execute(pool)
        .await
        .context("Failed to attach tag to advertisement")?;
    }

    Ok(())
}

async fn get_for_advertisement_sqlite(pool: &SqlitePool, advertisement_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.slug, t.name, t.color, t.created_at
        FROM advertisement_tags at
        INNER JOIN tags t ON t.id = at.tag_id
        WHERE at.advertisement_id = ?
        ORDER BY t.name ASC
        "#,
    )
    .bind(advertisement_id)
    .fetch_all(pool)
    .await
    .context("Failed to get tags for advertisement")?;

    Ok(rows.iter().map(row_to_tag_sqlite).collect())
}

async fn get_for_advertisements_sqlite(
    pool: &SqlitePool,
    advertisement_ids: &[i64],
) -> Result<Vec<(i64, Tag)>> {
    let sql = format!(
        r#"
        SELECT at.advertisement_id, t.id, t.slug, t.name, t.color, t.created_at
        FROM advertisement_tags at
        INNER JOIN tags t ON t.id = at.tag_id
        WHERE at.advertisement_id IN ({})
        ORDER BY t.name ASC
        "#,
        placeholders(advertisement_ids.len())
    );

    let mut query = sqlx::query(&sql);
    for id in advertisement_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get tags for advertisements")?;

    Ok(rows
        .iter()
        .map(|row| (row.get("advertisement_id"), row_to_tag_sqlite(row)))
        .collect())
}

async fn slug_exists_sqlite(pool: &SqlitePool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = match exclude_id {
        Some(id) => {
            sqlx::query("SELECT COUNT(*) as count FROM tags WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM tags WHERE slug = ?")
                .bind(slug)
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to check tag slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_tag_sqlite(row: &sqlx::sqlite::SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        color: row.get("color"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_tag_mysql(pool: &MySqlPool, slug: &str, name: &str, color: &str) -> Result<Tag> {
    let result = sqlx::query("INSERT INTO tags (slug, name, color) VALUES (?, ?, ?)")
        .bind(slug)
        .bind(name)
        .bind(color)
        .execute(pool)
        .await
        .context("Failed to create tag")?;

    let id = result.last_insert_id() as i64;

    get_tag_by_id_mysql(pool, id)
        .await?
        .context("Tag not found after insert")
}

async fn get_tag_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, slug, name, color, created_at FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by ID")?;

    Ok(row.map(|row| row_to_tag_mysql(&row)))
}

async fn get_tag_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, slug, name, color, created_at FROM tags WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by slug")?;

    Ok(row.map(|row| row_to_tag_mysql(&row)))
}

async fn exists_by_name_mysql(pool: &MySqlPool, name: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM tags WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .context("Failed to check tag name existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn list_with_counts_mysql(pool: &MySqlPool) -> Result<Vec<TagWithCount>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.slug, t.name, t.color, t.created_at, COUNT(at.advertisement_id) as advertisement_count
        FROM tags t
        LEFT JOIN advertisement_tags at ON at.tag_id = t.id
        GROUP BY t.id
        ORDER BY advertisement_count DESC, t.name ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list tags with counts")?;

    Ok(rows
        .iter()
        .map(|row| TagWithCount {
            tag: row_to_tag_mysql(row),
            advertisement_count: row.get("advertisement_count"),
        })
        .collect())
}

async fn set_for_advertisement_mysql(
    pool: &MySqlPool,
    advertisement_id: i64,
    tag_ids: &[i64],
) -> Result<()> {
    sqlx::query("DELETE FROM advertisement_tags WHERE advertisement_id = ?")
        .bind(advertisement_id)
        .execute(pool)
        .await
        .context("Failed to clear advertisement tags")?;

    for tag_id in tag_ids {
        sqlx::query(
            "INSERT IGNORE INTO advertisement_tags (advertisement_id, tag_id) VALUES (?, ?)",
        )
        .bind(advertisement_id)
        .bind(tag_id)
        .execute(pool)
        .await
        .context("Failed to attach tag to advertisement")?;
    }

    Ok(())
}

async fn get_for_advertisement_mysql(pool: &MySqlPool, advertisement_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.slug, t.name, t.color, t.created_at
        FROM advertisement_tags at
        INNER JOIN tags t ON t.id = at.tag_id
        WHERE at.advertisement_id = ?
        ORDER BY t.name ASC
        "#,
    )
    .bind(advertisement_id)
    .fetch_all(pool)
    .await
    .context("Failed to get tags for advertisement")?;

    Ok(rows.iter().map(row_to_tag_mysql).collect())
}

async fn get_for_advertisements_mysql(
    pool: &MySqlPool,
    advertisement_ids: &[i64],
) -> Result<Vec<(i64, Tag)>> {
    let sql = format!(
        r#"
        SELECT at.advertisement_id, t.id, t.slug, t.name, t.color, t.created_at
        FROM advertisement_tags at
        INNER JOIN tags t ON t.id = at.tag_id
        WHERE at.advertisement_id IN ({})
        ORDER BY t.name ASC
        "#,
        placeholders(advertisement_ids.len())
    );

    let mut query = sqlx::query(&sql);
    for id in advertisement_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get tags for advertisements")?;

    Ok(rows
        .iter()
        .map(|row| (row.get("advertisement_id"), row_to_tag_mysql(row)))
        .collect())
}

async fn slug_exists_mysql(pool: &MySqlPool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = match exclude_id {
        Some(id) => {
            sqlx::query("SELECT COUNT(*) as count FROM tags WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM tags WHERE slug = ?")
                .bind(slug)
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to check tag slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_tag_mysql(row: &sqlx::mysql::MySqlRow) -> Tag {
    Tag {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        color: row.get("color"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup() -> (DynDatabasePool, SqlxTagRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxTagRepository::new(pool.clone());
        (pool, repo)
    }

    async fn create_test_ad(pool: &SqlitePool, slug: &str, author_id: i64) -> i64 {
        let result = sqlx::query(
            "INSERT INTO advertisements (slug, title, description, price, city_id, category_id, author_id) \
             VALUES (?, ?, 'описание', 10, 1, 1, ?)",
        )
        .bind(slug)
        .bind(format!("Ad {}", slug))
        .bind(author_id)
        .execute(pool)
        .await
        .expect("Failed to create advertisement");
        result.last_insert_rowid()
    }

    async fn create_test_user(pool: &SqlitePool) -> i64 {
        let result = sqlx::query("INSERT INTO users (username, email) VALUES ('anna', 'anna@example.com')")
            .execute(pool)
            .await
            .expect("Failed to create user");
        result.last_insert_rowid()
    }

    #[tokio::test]
    async fn test_create_and_get_tag() {
        let (_pool, repo) = setup().await;

        let created = repo
            .create("torg", "Торг", "#ff8800")
            .await
            .expect("Failed to create tag");
        assert!(created.id > 0);
        assert_eq!(created.color, "#ff8800");

        let found = repo
            .get_by_slug("torg")
            .await
            .expect("Failed to get tag")
            .expect("Tag not found");
        assert_eq!(found.name, "Торг");
    }

    #[tokio::test]
    async fn test_exists_by_name() {
        let (_pool, repo) = setup().await;

        repo.create("torg", "Торг", "#ff8800")
            .await
            .expect("Failed to create tag");

        assert!(repo.exists_by_name("Торг").await.unwrap());
        assert!(!repo.exists_by_name("Обмен").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_and_get_for_advertisement() {
        let (pool, repo) = setup().await;
        let sqlite_pool = pool.as_sqlite().unwrap();
        let user_id = create_test_user(sqlite_pool).await;
        let ad_id = create_test_ad(sqlite_pool, "ad-1", user_id).await;

        let tag1 = repo.create("torg", "Торг", "#ff0000").await.unwrap();
        let tag2 = repo.create("obmen", "Обмен", "#00ff00").await.unwrap();

        repo.set_for_advertisement(ad_id, &[tag1.id, tag2.id])
            .await
            .expect("Failed to set tags");

        let tags = repo
            .get_for_advertisement(ad_id)
            .await
            .expect("Failed to get tags");
        assert_eq!(tags.len(), 2);

        // Replacing the set removes what is no longer listed
        repo.set_for_advertisement(ad_id, &[tag2.id])
            .await
            .expect("Failed to set tags");
        let tags = repo.get_for_advertisement(ad_id).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].slug, "obmen");
    }

    #[tokio::test]
    async fn test_batch_prefetch() {
        let (pool, repo) = setup().await;
        let sqlite_pool = pool.as_sqlite().unwrap();
        let user_id = create_test_user(sqlite_pool).await;
        let ad1 = create_test_ad(sqlite_pool, "ad-1", user_id).await;
        let ad2 = create_test_ad(sqlite_pool, "ad-2", user_id).await;

        let tag = repo.create("torg", "Торг", "#ff0000").await.unwrap();
        repo.set_for_advertisement(ad1, &[tag.id]).await.unwrap();
        repo.set_for_advertisement(ad2, &[tag.id]).await.unwrap();

        let pairs = repo
            .get_for_advertisements(&[ad1, ad2])
            .await
            .expect("Failed to prefetch tags");
        assert_eq!(pairs.len(), 2);

        let empty = repo.get_for_advertisements(&[]).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_list_with_counts_ordering() {
        let (pool, repo) = setup().await;
        let sqlite_pool = pool.as_sqlite().unwrap();
        let user_id = create_test_user(sqlite_pool).await;
        let ad1 = create_test_ad(sqlite_pool, "ad-1", user_id).await;
        let ad2 = create_test_ad(sqlite_pool, "ad-2", user_id).await;

        let rare = repo.create("rare", "Редкий", "#111111").await.unwrap();
        let common = repo.create("common", "Частый", "#222222").await.unwrap();

        repo.set_for_advertisement(ad1, &[common.id]).await.unwrap();
        repo.set_for_advertisement(ad2, &[common.id, rare.id]).await.unwrap();

        let counts = repo.list_with_counts().await.expect("Failed to list");
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].tag.slug, "common");
        assert_eq!(counts[0].advertisement_count, 2);
        assert_eq!(counts[1].advertisement_count, 1);
    }
}
