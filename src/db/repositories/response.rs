//! Response repository
//!
//! Database operations for responses (offers/inquiries) on advertisements.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateResponseInput, Response, ResponseStatus, ResponseWithMeta};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Response repository trait
#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// Create a new response with status `new`
    async fn create(&self, input: &CreateResponseInput) -> Result<Response>;

    /// Get response by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Response>>;

    /// Get response by ID with advertisement and user metadata joined in
    async fn get_with_meta(&self, id: i64) -> Result<Option<ResponseWithMeta>>;

    /// Persist a status transition
    async fn set_status(&self, id: i64, status: ResponseStatus) -> Result<()>;

    /// Responses received by a user, newest first
    async fn list_by_recipient(&self, user_id: i64) -> Result<Vec<ResponseWithMeta>>;

    /// Responses sent by a user, newest first
    async fn list_by_sender(&self, user_id: i64) -> Result<Vec<ResponseWithMeta>>;
}

/// SQLx-based response repository implementation
pub struct SqlxResponseRepository {
    pool: DynDatabasePool,
}

impl SqlxResponseRepository {
    /// Create a new SQLx response repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ResponseRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ResponseRepository for SqlxResponseRepository {
    async fn create(&self, input: &CreateResponseInput) -> Result<Response> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Response>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_with_meta(&self, id: i64) -> Result<Option<ResponseWithMeta>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_with_meta_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_with_meta_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn set_status(&self, id: i64, status: ResponseStatus) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_status_sqlite(self.pool.as_sqlite().unwrap(), id, status).await
            }
            DatabaseDriver::Mysql => {
                set_status_mysql(self.pool.as_mysql().unwrap(), id, status).await
            }
        }
    }

    async fn list_by_recipient(&self, user_id: i64) -> Result<Vec<ResponseWithMeta>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_column_sqlite(self.pool.as_sqlite().unwrap(), "recipient_id", user_id).await
            }
            DatabaseDriver::Mysql => {
                list_by_column_mysql(self.pool.as_mysql().unwrap(), "recipient_id", user_id).await
            }
        }
    }

    async fn list_by_sender(&self, user_id: i64) -> Result<Vec<ResponseWithMeta>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_column_sqlite(self.pool.as_sqlite().unwrap(), "sender_id", user_id).await
            }
            DatabaseDriver::Mysql => {
                list_by_column_mysql(self.pool.as_mysql().unwrap(), "sender_id", user_id).await
            }
        }
    }
}

// ============================================================================
// Shared SQL
// ============================================================================

const SELECT_META: &str = "\
    SELECT r.id, r.advertisement_id, r.sender_id, r.recipient_id, r.text, r.status, r.created_at, \
           a.title AS advertisement_title, a.slug AS advertisement_slug, \
           s.username AS sender_username, rc.username AS recipient_username \
    FROM responses r \
    INNER JOIN advertisements a ON a.id = r.advertisement_id \
    INNER JOIN users s ON s.id = r.sender_id \
    INNER JOIN users rc ON rc.id = r.recipient_id";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, input: &CreateResponseInput) -> Result<Response> {
    let now = chrono::Utc::now();

    let result = sqlx::query(
        "INSERT INTO responses (advertisement_id, sender_id, recipient_id, text, status, created_at) \
         VALUES (?, ?, ?, ?, 'new', ?)",
    )
    .bind(input.advertisement_id)
    .bind(input.sender_id)
    .bind(input.recipient_id)
    .bind(&input.text)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create response")?;

    let id = result.last_insert_rowid();

    Ok(Response {
        id,
        advertisement_id: input.advertisement_id,
        sender_id: input.sender_id,
        recipient_id: input.recipient_id,
        text: input.text.clone(),
        status: ResponseStatus::New,
        created_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Response>> {
    let row = sqlx::query(
        "SELECT id, advertisement_id, sender_id, recipient_id, text, status, created_at \
         FROM responses WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get response by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_response_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_with_meta_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<ResponseWithMeta>> {
    let sql = format!("{} WHERE r.id = ?", SELECT_META);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get response with meta")?;

    match row {
        Some(row) => Ok(Some(row_to_meta_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn set_status_sqlite(pool: &SqlitePool, id: i64, status: ResponseStatus) -> Result<()> {
    sqlx::query("UPDATE responses SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to set response status")?;

    Ok(())
}

async fn list_by_column_sqlite(
    pool: &SqlitePool,
    column: &str,
    user_id: i64,
) -> Result<Vec<ResponseWithMeta>> {
    // `column` is one of two compile-time literals, never user input
    let sql = format!(
        "{} WHERE r.{} = ? ORDER BY r.created_at DESC, r.id DESC",
        SELECT_META, column
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list responses")?;

    let mut responses = Vec::new();
    for row in rows {
        responses.push(row_to_meta_sqlite(&row)?);
    }

    Ok(responses)
}

fn row_to_response_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Response> {
    let status_str: String = row.get("status");
    let status = ResponseStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid response status: {}", status_str))?;

    Ok(Response {
        id: row.get("id"),
        advertisement_id: row.get("advertisement_id"),
        sender_id: row.get("sender_id"),
        recipient_id: row.get("recipient_id"),
        text: row.get("text"),
        status,
        created_at: row.get("created_at"),
    })
}

fn row_to_meta_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<ResponseWithMeta> {
    Ok(ResponseWithMeta {
        response: row_to_response_sqlite(row)?,
        advertisement_title: row.get("advertisement_title"),
        advertisement_slug: row.get("advertisement_slug"),
        sender_username: row.get("sender_username"),
        recipient_username: row.get("recipient_username"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, input: &CreateResponseInput) -> Result<Response> {
    let now = chrono::Utc::now();

    let result = sqlx::query(
        "INSERT INTO responses (advertisement_id, sender_id, recipient_id, text, status, created_at) \
         VALUES (?, ?, ?, ?, 'new', ?)",
    )
    .bind(input.advertisement_id)
    .bind(input.sender_id)
    .bind(input.recipient_id)
    .bind(&input.text)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create response")?;

    let id = result.last_insert_id() as i64;

    Ok(Response {
        id,
        advertisement_id: input.advertisement_id,
        sender_id: input.sender_id,
        recipient_id: input.recipient_id,
        text: input.text.clone(),
        status: ResponseStatus::New,
        created_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Response>> {
    let row = sqlx::query(
        "SELECT id, advertisement_id, sender_id, recipient_id, text, status, created_at \
         FROM responses WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get response by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_response_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_with_meta_mysql(pool: &MySqlPool, id: i64) -> Result<Option<ResponseWithMeta>> {
    let sql = format!("{} WHERE r.id = ?", SELECT_META);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get response with meta")?;

    match row {
        Some(row) => Ok(Some(row_to_meta_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn set_status_mysql(pool: &MySqlPool, id: i64, status: ResponseStatus) -> Result<()> {
    sqlx::query("UPDATE responses SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to set response status")?;

    Ok(())
}

async fn list_by_column_mysql(
    pool: &MySqlPool,
    column: &str,
    user_id: i64,
) -> Result<Vec<ResponseWithMeta>> {
    let sql = format!(
        "{} WHERE r.{} = ? ORDER BY r.created_at DESC, r.id DESC",
        SELECT_META, column
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list responses")?;

    let mut responses = Vec::new();
    for row in rows {
        responses.push(row_to_meta_mysql(&row)?);
    }

    Ok(responses)
}

fn row_to_response_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Response> {
    let status_str: String = row.get("status");
    let status = ResponseStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid response status: {}", status_str))?;

    Ok(Response {
        id: row.get("id"),
        advertisement_id: row.get("advertisement_id"),
        sender_id: row.get("sender_id"),
        recipient_id: row.get("recipient_id"),
        text: row.get("text"),
        status,
        created_at: row.get("created_at"),
    })
}

fn row_to_meta_mysql(row: &sqlx::mysql::MySqlRow) -> Result<ResponseWithMeta> {
    Ok(ResponseWithMeta {
        response: row_to_response_mysql(row)?,
        advertisement_title: row.get("advertisement_title"),
        advertisement_slug: row.get("advertisement_slug"),
        sender_username: row.get("sender_username"),
        recipient_username: row.get("recipient_username"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup() -> (DynDatabasePool, SqlxResponseRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxResponseRepository::new(pool.clone());
        (pool, repo)
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

    async fn create_test_ad(pool: &SqlitePool, slug: &str, author_id: i64) -> i64 {
        let result = sqlx::query(
            "INSERT INTO advertisements (slug, title, description, price, city_id, category_id, author_id) \
             VALUES (?, 'Стол', 'Описание', 100, 1, 1, ?)",
        )
        .bind(slug)
        .bind(author_id)
        .execute(pool)
        .await
        .expect("Failed to create advertisement");
        result.last_insert_rowid()
    }

    #[tokio::test]
    async fn test_create_starts_new() {
        let (pool, repo) = setup().await;
        let sqlite = pool.as_sqlite().unwrap();
        let anna = create_test_user(sqlite, "anna").await;
        let boris = create_test_user(sqlite, "boris").await;
        let ad_id = create_test_ad(sqlite, "stol", anna).await;

        let response = repo
            .create(&CreateResponseInput {
                advertisement_id: ad_id,
                sender_id: boris,
                recipient_id: anna,
                text: "Интересно".to_string(),
            })
            .await
            .expect("Failed to create response");

        assert!(response.id > 0);
        assert_eq!(response.status, ResponseStatus::New);
        assert_eq!(response.recipient_id, anna);
    }

    #[tokio::test]
    async fn test_set_status() {
        let (pool, repo) = setup().await;
        let sqlite = pool.as_sqlite().unwrap();
        let anna = create_test_user(sqlite, "anna").await;
        let boris = create_test_user(sqlite, "boris").await;
        let ad_id = create_test_ad(sqlite, "stol", anna).await;

        let response = repo
            .create(&CreateResponseInput {
                advertisement_id: ad_id,
                sender_id: boris,
                recipient_id: anna,
                text: "Интересно".to_string(),
            })
            .await
            .unwrap();

        repo.set_status(response.id, ResponseStatus::Accepted)
            .await
            .expect("Failed to set status");

        let found = repo.get_by_id(response.id).await.unwrap().unwrap();
        assert_eq!(found.status, ResponseStatus::Accepted);
    }

    #[tokio::test]
    async fn test_get_with_meta() {
        let (pool, repo) = setup().await;
        let sqlite = pool.as_sqlite().unwrap();
        let anna = create_test_user(sqlite, "anna").await;
        let boris = create_test_user(sqlite, "boris").await;
        let ad_id = create_test_ad(sqlite, "stol", anna).await;

        let response = repo
            .create(&CreateResponseInput {
                advertisement_id: ad_id,
                sender_id: boris,
                recipient_id: anna,
                text: "Интересно".to_string(),
            })
            .await
            .unwrap();

        let meta = repo
            .get_with_meta(response.id)
            .await
            .expect("Failed to get meta")
            .expect("Response not found");
        assert_eq!(meta.advertisement_slug, "stol");
        assert_eq!(meta.sender_username, "boris");
        assert_eq!(meta.recipient_username, "anna");
    }

    #[tokio::test]
    async fn test_lists_by_role() {
        let (pool, repo) = setup().await;
        let sqlite = pool.as_sqlite().unwrap();
        let anna = create_test_user(sqlite, "anna").await;
        let boris = create_test_user(sqlite, "boris").await;
        let clara = create_test_user(sqlite, "clara").await;
        let ad_id = create_test_ad(sqlite, "stol", anna).await;

        for sender in [boris, clara] {
            repo.create(&CreateResponseInput {
                advertisement_id: ad_id,
                sender_id: sender,
                recipient_id: anna,
                text: "Интересно".to_string(),
            })
            .await
            .unwrap();
        }

        let received = repo.list_by_recipient(anna).await.unwrap();
        assert_eq!(received.len(), 2);

        let sent = repo.list_by_sender(boris).await.unwrap();
        assert_eq!(sent.len(), 1);

        let none = repo.list_by_recipient(clara).await.unwrap();
        assert!(none.is_empty());
    }
}
