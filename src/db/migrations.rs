//! Database migrations module
//!
//! This module provides code-based database migrations for the adboard
//! system. All migrations are embedded directly in Rust code as SQL strings,
//! supporting both SQLite and MySQL databases for single-binary deployment.
//!
//! # Architecture
//!
//! Each migration is defined as a `Migration` struct containing:
//! - `version`: Unique version number for ordering
//! - `name`: Human-readable migration name
//! - `up_sqlite`: SQL for SQLite database
//! - `up_mysql`: SQL for MySQL database
//!
//! Reference entities (cities, categories) use `ON DELETE RESTRICT` so that
//! removing a shared reference can never silently destroy dependent listings;
//! only `advertisements -> responses` and the tag join table cascade.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    /// Migration version number
    pub version: i64,
    /// Migration name/description
    pub name: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// All migrations for the adboard system.
/// These are embedded in the binary for single-binary deployment.
pub const MIGRATIONS: &[Migration] = &[
    // Migration 1: Create users table (identity references)
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_users_username ON users(username);
        "#,
    },
    // Migration 2: Create sessions table (the contract with the identity provider)
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id BIGINT NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    // Migration 3: Create cities table
    Migration {
        version: 3,
        name: "create_cities",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS cities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(100) NOT NULL UNIQUE,
                name VARCHAR(100) NOT NULL UNIQUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_cities_slug ON cities(slug);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS cities (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                slug VARCHAR(100) NOT NULL UNIQUE,
                name VARCHAR(100) NOT NULL UNIQUE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_cities_slug ON cities(slug);
        "#,
    },
    // Migration 4: Create categories table
    Migration {
        version: 4,
        name: "create_categories",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(100) NOT NULL UNIQUE,
                name VARCHAR(100) NOT NULL,
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_categories_slug ON categories(slug);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS categories (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                slug VARCHAR(100) NOT NULL UNIQUE,
                name VARCHAR(100) NOT NULL,
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_categories_slug ON categories(slug);
        "#,
    },
    // Migration 5: Create tags table
    Migration {
        version: 5,
        name: "create_tags",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(100) NOT NULL UNIQUE,
                name VARCHAR(100) NOT NULL UNIQUE,
                color VARCHAR(7) NOT NULL DEFAULT '#777777',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_tags_slug ON tags(slug);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                slug VARCHAR(100) NOT NULL UNIQUE,
                name VARCHAR(100) NOT NULL UNIQUE,
                color VARCHAR(7) NOT NULL DEFAULT '#777777',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_tags_slug ON tags(slug);
        "#,
    },
    // Migration 6: Create advertisements table
    Migration {
        version: 6,
        name: "create_advertisements",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS advertisements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(255) NOT NULL UNIQUE,
                title VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                price REAL NOT NULL DEFAULT 0,
                city_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                cover VARCHAR(255),
                views INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (city_id) REFERENCES cities(id) ON DELETE RESTRICT,
                FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE RESTRICT,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_advertisements_slug ON advertisements(slug);
            CREATE INDEX IF NOT EXISTS idx_advertisements_city_id ON advertisements(city_id);
            CREATE INDEX IF NOT EXISTS idx_advertisements_category_id ON advertisements(category_id);
            CREATE INDEX IF NOT EXISTS idx_advertisements_author_id ON advertisements(author_id);
            CREATE INDEX IF NOT EXISTS idx_advertisements_created_at ON advertisements(created_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS advertisements (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                slug VARCHAR(255) NOT NULL UNIQUE,
                title VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                price DOUBLE NOT NULL DEFAULT 0,
                city_id BIGINT NOT NULL,
                category_id BIGINT NOT NULL,
                author_id BIGINT NOT NULL,
                cover VARCHAR(255),
                views BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (city_id) REFERENCES cities(id) ON DELETE RESTRICT,
                FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE RESTRICT,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_advertisements_slug ON advertisements(slug);
            CREATE INDEX idx_advertisements_city_id ON advertisements(city_id);
            CREATE INDEX idx_advertisements_category_id ON advertisements(category_id);
            CREATE INDEX idx_advertisements_author_id ON advertisements(author_id);
            CREATE INDEX idx_advertisements_created_at ON advertisements(created_at);
        "#,
    },
    // Migration 7: Create advertisement_tags join table
    Migration {
        version: 7,
        name: "create_advertisement_tags",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS advertisement_tags (
                advertisement_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (advertisement_id, tag_id),
                FOREIGN KEY (advertisement_id) REFERENCES advertisements(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_advertisement_tags_tag_id ON advertisement_tags(tag_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS advertisement_tags (
                advertisement_id BIGINT NOT NULL,
                tag_id BIGINT NOT NULL,
                PRIMARY KEY (advertisement_id, tag_id),
                FOREIGN KEY (advertisement_id) REFERENCES advertisements(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_advertisement_tags_tag_id ON advertisement_tags(tag_id);
        "#,
    },
    // Migration 8: Create responses table
    Migration {
        version: 8,
        name: "create_responses",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS responses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                advertisement_id INTEGER NOT NULL,
                sender_id INTEGER NOT NULL,
                recipient_id INTEGER NOT NULL,
                text TEXT NOT NULL,
                status VARCHAR(10) NOT NULL DEFAULT 'new',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (advertisement_id) REFERENCES advertisements(id) ON DELETE CASCADE,
                FOREIGN KEY (sender_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (recipient_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_responses_advertisement_id ON responses(advertisement_id);
            CREATE INDEX IF NOT EXISTS idx_responses_sender_id ON responses(sender_id);
            CREATE INDEX IF NOT EXISTS idx_responses_recipient_id ON responses(recipient_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS responses (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                advertisement_id BIGINT NOT NULL,
                sender_id BIGINT NOT NULL,
                recipient_id BIGINT NOT NULL,
                text TEXT NOT NULL,
                status VARCHAR(10) NOT NULL DEFAULT 'new',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (advertisement_id) REFERENCES advertisements(id) ON DELETE CASCADE,
                FOREIGN KEY (sender_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (recipient_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_responses_advertisement_id ON responses(advertisement_id);
            CREATE INDEX idx_responses_sender_id ON responses(sender_id);
            CREATE INDEX idx_responses_recipient_id ON responses(recipient_id);
        "#,
    },
    // Migration 9: Seed reference data (categories and cities)
    Migration {
        version: 9,
        name: "seed_reference_data",
        up_sqlite: r#"
            INSERT OR IGNORE INTO categories (slug, name, description) VALUES
                ('electronics', 'Электроника', 'Техника, гаджеты, компьютеры'),
                ('clothing', 'Одежда', 'Одежда, обувь, аксессуары'),
                ('furniture', 'Мебель', 'Мебель для дома и офиса'),
                ('transport', 'Транспорт', 'Автомобили, велосипеды, запчасти'),
                ('real-estate', 'Недвижимость', 'Квартиры, дома, участки'),
                ('jobs', 'Работа', 'Вакансии и резюме'),
                ('services', 'Услуги', 'Различные услуги');
            INSERT OR IGNORE INTO cities (slug, name) VALUES
                ('moscow', 'Москва'),
                ('saint-petersburg', 'Санкт-Петербург'),
                ('novosibirsk', 'Новосибирск'),
                ('ekaterinburg', 'Екатеринбург'),
                ('kazan', 'Казань'),
                ('nizhny-novgorod', 'Нижний Новгород'),
                ('chelyabinsk', 'Челябинск'),
                ('samara', 'Самара'),
                ('omsk', 'Омск'),
                ('rostov-on-don', 'Ростов-на-Дону'),
                ('ufa', 'Уфа'),
                ('krasnoyarsk', 'Красноярск'),
                ('voronezh', 'Воронеж'),
                ('perm', 'Пермь'),
                ('volgograd', 'Волгоград'),
                ('krasnodar', 'Краснодар'),
                ('saratov', 'Саратов'),
                ('tyumen', 'Тюмень'),
                ('tolyatti', 'Тольятти'),
                ('izhevsk', 'Ижевск');
        "#,
        up_mysql: r#"
            INSERT IGNORE INTO categories (slug, name, description) VALUES
                ('electronics', 'Электроника', 'Техника, гаджеты, компьютеры'),
                ('clothing', 'Одежда', 'Одежда, обувь, аксессуары'),
                ('furniture', 'Мебель', 'Мебель для дома и офиса'),
                ('transport', 'Транспорт', 'Автомобили, велосипеды, запчасти'),
                ('real-estate', 'Недвижимость', 'Квартиры, дома, участки'),
                ('jobs', 'Работа', 'Вакансии и резюме'),
                ('services', 'Услуги', 'Различные услуги');
            INSERT IGNORE INTO cities (slug, name) VALUES
                ('moscow', 'Москва'),
                ('saint-petersburg', 'Санкт-Петербург'),
                ('novosibirsk', 'Новосибирск'),
                ('ekaterinburg', 'Екатеринбург'),
                ('kazan', 'Казань'),
                ('nizhny-novgorod', 'Нижний Новгород'),
                ('chelyabinsk', 'Челябинск'),
                ('samara', 'Самара'),
                ('omsk', 'Омск'),
                ('rostov-on-don', 'Ростов-на-Дону'),
                ('ufa', 'Уфа'),
                ('krasnoyarsk', 'Красноярск'),
                ('voronezh', 'Воронеж'),
                ('perm', 'Пермь'),
                ('volgograd', 'Волгоград'),
                ('krasnodar', 'Краснодар'),
                ('saratov', 'Саратов'),
                ('tyumen', 'Тюмень'),
                ('tolyatti', 'Тольятти'),
                ('izhevsk', 'Ижевск');
        "#,
    },
];

/// Run all pending database migrations.
///
/// This function:
/// 1. Creates the migrations tracking table if it doesn't exist
/// 2. Checks which migrations have already been applied
/// 3. Runs any pending migrations in order
///
/// # Returns
///
/// Number of migrations applied
///
/// # Errors
///
/// Returns an error if any migration fails to apply
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => get_applied_migrations_sqlite(pool.as_sqlite().unwrap()).await,
        DatabaseDriver::Mysql => get_applied_migrations_mysql(pool.as_mysql().unwrap()).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

/// Apply a single migration
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => apply_migration_sqlite(pool.as_sqlite().unwrap(), migration).await,
        DatabaseDriver::Mysql => apply_migration_mysql(pool.as_mysql().unwrap(), migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    // Execute migration SQL (may contain multiple statements)
    for statement in split_sql_statements(migration.up_sqlite) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    // Record the migration
    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        format!("{}...", &sql[..100])
    } else {
        sql.to_string()
    }
}

/// Split SQL into individual statements, handling comments properly
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut current_start = 0;
    let mut in_statement = false;

    for (i, c) in sql.char_indices() {
        match c {
            ';' => {
                if in_statement {
                    let stmt = sql[current_start..i].trim();
                    if !stmt.is_empty() && !is_comment_only(stmt) {
                        statements.push(stmt);
                    }
                    in_statement = false;
                }
                current_start = i + 1;
            }
            _ if !c.is_whitespace() && !in_statement => {
                current_start = i;
                in_statement = true;
            }
            _ => {}
        }
    }

    // Handle last statement without trailing semicolon
    if in_statement {
        let stmt = sql[current_start..].trim();
        if !stmt.is_empty() && !is_comment_only(stmt) {
            statements.push(stmt);
        }
    }

    statements
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    for line in s.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("--") {
            return false;
        }
    }
    true
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    let _ = create_migrations_table(pool).await;

    let applied = get_applied_migrations(pool).await?;
    Ok(applied.len() == MIGRATIONS.len())
}

/// Get the total number of migrations defined
pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        // Running again should apply 0 migrations
        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_is_up_to_date() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let up_to_date = is_up_to_date(&pool).await.expect("Failed to check");
        assert!(!up_to_date);

        run_migrations(&pool).await.expect("Failed to run migrations");
        let up_to_date = is_up_to_date(&pool).await.expect("Failed to check");
        assert!(up_to_date);
    }

    #[tokio::test]
    async fn test_seed_data_present() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();

        let row = sqlx::query("SELECT COUNT(*) as count FROM categories")
            .fetch_one(sqlite_pool)
            .await
            .expect("Failed to query categories");
        let count: i64 = row.get("count");
        assert_eq!(count, 7);

        let row = sqlx::query("SELECT COUNT(*) as count FROM cities")
            .fetch_one(sqlite_pool)
            .await
            .expect("Failed to query cities");
        let count: i64 = row.get("count");
        assert_eq!(count, 20);

        let row = sqlx::query("SELECT name FROM categories WHERE slug = 'transport'")
            .fetch_one(sqlite_pool)
            .await
            .expect("Failed to query category");
        let name: String = row.get("name");
        assert_eq!(name, "Транспорт");
    }

    #[tokio::test]
    async fn test_city_delete_restricted_while_referenced() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO users (username, email) VALUES ('anna', 'anna@example.com')")
            .execute(sqlite_pool)
            .await
            .expect("Failed to create user");

        sqlx::query(
            "INSERT INTO advertisements (slug, title, description, price, city_id, category_id, author_id) \
             VALUES ('stol', 'Стол', 'Дубовый стол', 100, \
                     (SELECT id FROM cities WHERE slug = 'moscow'), \
                     (SELECT id FROM categories WHERE slug = 'furniture'), 1)",
        )
        .execute(sqlite_pool)
        .await
        .expect("Failed to create advertisement");

        // Deleting a referenced city must be refused
        let result = sqlx::query("DELETE FROM cities WHERE slug = 'moscow'")
            .execute(sqlite_pool)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_responses_cascade_with_advertisement() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO users (username, email) VALUES ('anna', 'anna@example.com')")
            .execute(sqlite_pool)
            .await
            .expect("Failed to create user");
        sqlx::query("INSERT INTO users (username, email) VALUES ('boris', 'boris@example.com')")
            .execute(sqlite_pool)
            .await
            .expect("Failed to create user");

        sqlx::query(
            "INSERT INTO advertisements (slug, title, description, price, city_id, category_id, author_id) \
             VALUES ('stol', 'Стол', 'Дубовый стол', 100, 1, 1, 1)",
        )
        .execute(sqlite_pool)
        .await
        .expect("Failed to create advertisement");

        sqlx::query(
            "INSERT INTO responses (advertisement_id, sender_id, recipient_id, text) \
             VALUES (1, 2, 1, 'Интересно')",
        )
        .execute(sqlite_pool)
        .await
        .expect("Failed to create response");

        sqlx::query("DELETE FROM advertisements WHERE id = 1")
            .execute(sqlite_pool)
            .await
            .expect("Failed to delete advertisement");

        let row = sqlx::query("SELECT COUNT(*) as count FROM responses")
            .fetch_one(sqlite_pool)
            .await
            .expect("Failed to count responses");
        let count: i64 = row.get("count");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO tags (slug, name, color) VALUES ('torg', 'Торг', '#ff0000')")
            .execute(sqlite_pool)
            .await
            .expect("Failed to create tag");

        // Duplicate tag name must be rejected
        let result =
            sqlx::query("INSERT INTO tags (slug, name, color) VALUES ('torg-2', 'Торг', '#00ff00')")
                .execute(sqlite_pool)
                .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT);";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);

        // Test with comments
        let sql_with_comments = "-- Comment\nCREATE TABLE a (id INT);";
        let statements = split_sql_statements(sql_with_comments);
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- This is a comment"));
        assert!(!is_comment_only("CREATE TABLE test"));
    }

    #[test]
    fn test_total_migrations() {
        assert_eq!(total_migrations(), 9);
    }
}
