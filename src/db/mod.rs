/// Database layer for Pupmatch
///
/// Manages the SQLite connection pool and embedded migrations, and
/// provides the row types shared by the account manager.

pub mod account;

use crate::error::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
        }
    }
}

/// Create a SQLite connection pool
pub async fn create_pool(path: &Path, options: DatabaseOptions) -> AppResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(options.max_connections)
        .connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(if options.enable_wal {
                    SqliteJournalMode::Wal
                } else {
                    SqliteJournalMode::Delete
                })
                .foreign_keys(true)
                .busy_timeout(std::time::Duration::from_secs(5)),
        )
        .await?;

    Ok(pool)
}

/// Run migrations
/// Migrations are embedded at compile time from ./migrations directory
pub async fn run_migrations(pool: &SqlitePool) -> AppResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;

    Ok(())
}

/// Test database connection
pub async fn test_connection(pool: &SqlitePool) -> AppResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// In-memory database with migrations applied.
///
/// A single connection keeps every query on the same in-memory database.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    use std::str::FromStr;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(
            SqliteConnectOptions::from_str(":memory:")
                .unwrap()
                .foreign_keys(true),
        )
        .await
        .unwrap();

    run_migrations(&pool).await.unwrap();
    pool
}

/// Insert a bare account row and return its id
#[cfg(test)]
pub async fn insert_test_account(pool: &SqlitePool, username: &str) -> i64 {
    sqlx::query(
        "INSERT INTO account (username, password_hash, created_at) VALUES (?1, 'x', ?2)",
    )
    .bind(username)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

/// Insert a dog row and return its id
#[cfg(test)]
pub async fn insert_test_dog(pool: &SqlitePool, age: i64, gender: &str, size: &str) -> i64 {
    sqlx::query("INSERT INTO dog (name, age, gender, size) VALUES ('Buddy', ?1, ?2, ?3)")
        .bind(age)
        .bind(gender)
        .bind(size)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}
