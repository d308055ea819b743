//! City repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::City;
use crate::services::slug::SlugLookup;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// City repository trait
#[async_trait]
pub trait CityRepository: SlugLookup {
    /// Create a new city
    async fn create(&self, slug: &str, name: &str) -> Result<City>;

    /// Get city by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<City>>;

    /// Get city by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<City>>;

    /// Get city by exact name
    async fn get_by_name(&self, name: &str) -> Result<Option<City>>;

    /// List all cities ordered by name
    async fn list(&self) -> Result<Vec<City>>;
}

/// SQLx-based city repository implementation
pub struct SqlxCityRepository {
    pool: DynDatabasePool,
}

impl SqlxCityRepository {
    /// Create a new SQLx city repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CityRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SlugLookup for SqlxCityRepository {
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
impl CityRepository for SqlxCityRepository {
    async fn create(&self, slug: &str, name: &str) -> Result<City> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_city_sqlite(self.pool.as_sqlite().unwrap(), slug, name).await
            }
            DatabaseDriver::Mysql => {
                create_city_mysql(self.pool.as_mysql().unwrap(), slug, name).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<City>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_city_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_city_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<City>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_city_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_city_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<City>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_city_by_name_sqlite(self.pool.as_sqlite().unwrap(), name).await
            }
            DatabaseDriver::Mysql => {
                get_city_by_name_mysql(self.pool.as_mysql().unwrap(), name).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<City>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_cities_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_cities_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_city_sqlite(pool: &SqlitePool, slug: &str, name: &str) -> Result<City> {
    let result = sqlx::query("INSERT INTO cities (slug, name) VALUES (?, ?)")
        .bind(slug)
        .bind(name)
        .execute(pool)
        .await
        .context("Failed to create city")?;

    let id = result.last_insert_rowid();

    get_city_by_id_sqlite(pool, id)
        .await?
        .context("City not found after insert")
}

async fn get_city_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<City>> {
    let row = sqlx::query("SELECT id, slug, name, created_at FROM cities WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get city by ID")?;

    Ok(row.map(|row| row_to_city_sqlite(&row)))
}

async fn get_city_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<City>> {
    let row = sqlx::query("SELECT id, slug, name, created_at FROM cities WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get city by slug")?;

    Ok(row.map(|row| row_to_city_sqlite(&row)))
}

async fn get_city_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<City>> {
    let row = sqlx::query("SELECT id, slug, name, created_at FROM cities WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get city by name")?;

    Ok(row.map(|row| row_to_city_sqlite(&row)))
}

async fn list_cities_sqlite(pool: &SqlitePool) -> Result<Vec<City>> {
    let rows = sqlx::query("SELECT id, slug, name, created_at FROM cities ORDER BY name ASC")
        .fetch_all(pool)
        .await
        .context("Failed to list cities")?;

    Ok(rows.iter().map(row_to_city_sqlite).collect())
}

async fn slug_exists_sqlite(pool: &SqlitePool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = match exclude_id {
        Some(id) => {
            sqlx::query("SELECT COUNT(*) as count FROM cities WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM cities WHERE slug = ?")
                .bind(slug)
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to check city slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_city_sqlite(row: &sqlx::sqlite::SqliteRow) -> City {
    City {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_city_mysql(pool: &MySqlPool, slug: &str, name: &str) -> Result<City> {
    let result = sqlx::query("INSERT INTO cities (slug, name) VALUES (?, ?)")
        .bind(slug)
        .bind(name)
        .execute(pool)
        .await
        .context("Failed to create city")?;

    let id = result.last_insert_id() as i64;

    get_city_by_id_mysql(pool, id)
        .await?
        .context("City not found after insert")
}

async fn get_city_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<City>> {
    let row = sqlx::query("SELECT id, slug, name, created_at FROM cities WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get city by ID")?;

    Ok(row.map(|row| row_to_city_mysql(&row)))
}

async fn get_city_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<City>> {
    let row = sqlx::query("SELECT id, slug, name, created_at FROM cities WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get city by slug")?;

    Ok(row.map(|row| row_to_city_mysql(&row)))
}

async fn get_city_by_name_mysql(pool: &MySqlPool, name: &str) -> Result<Option<City>> {
    let row = sqlx::query("SELECT id, slug, name, created_at FROM cities WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get city by name")?;

    Ok(row.map(|row| row_to_city_mysql(&row)))
}

async fn list_cities_mysql(pool: &MySqlPool) -> Result<Vec<City>> {
    let rows = sqlx::query("SELECT id, slug, name, created_at FROM cities ORDER BY name ASC")
        .fetch_all(pool)
        .await
        .context("Failed to list cities")?;

    Ok(rows.iter().map(row_to_city_mysql).collect())
}

async fn slug_exists_mysql(pool: &MySqlPool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = match exclude_id {
        Some(id) => {
            sqlx::query("SELECT COUNT(*) as count FROM cities WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM cities WHERE slug = ?")
                .bind(slug)
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to check city slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_city_mysql(row: &sqlx::mysql::MySqlRow) -> City {
    City {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxCityRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxCityRepository::new(pool)
    }

    #[tokio::test]
    async fn test_seeded_cities_listed() {
        let repo = setup_test_repo().await;

        let cities = repo.list().await.expect("Failed to list cities");
        assert_eq!(cities.len(), 20);
    }

    #[tokio::test]
    async fn test_get_by_slug_and_name() {
        let repo = setup_test_repo().await;

        let by_slug = repo
            .get_by_slug("moscow")
            .await
            .expect("Failed to get city")
            .expect("City not found");
        assert_eq!(by_slug.name, "Москва");

        let by_name = repo
            .get_by_name("Москва")
            .await
            .expect("Failed to get city")
            .expect("City not found");
        assert_eq!(by_name.id, by_slug.id);
    }

    #[tokio::test]
    async fn test_create_city() {
        let repo = setup_test_repo().await;

        let created = repo
            .create("sochi", "Сочи")
            .await
            .expect("Failed to create city");
        assert!(created.id > 0);
        assert_eq!(created.slug, "sochi");
    }

    #[tokio::test]
    async fn test_slug_exists_with_exclusion() {
        let repo = setup_test_repo().await;

        let moscow = repo
            .get_by_slug("moscow")
            .await
            .expect("Failed to get city")
            .expect("City not found");

        assert!(repo.slug_exists("moscow", None).await.unwrap());
        assert!(!repo.slug_exists("moscow", Some(moscow.id)).await.unwrap());
        assert!(!repo.slug_exists("atlantis", None).await.unwrap());
    }
}
