//! Database connection pool abstraction
//!
//! This module provides a unified interface for database operations that works
//! with both SQLite and MySQL backends. The appropriate pool is created based
//! on the configuration.
//!
//! Repositories write each query once and run it through [`with_pool!`],
//! which expands the body against the concrete pool type of the active
//! driver. Rows are read through [`RowAccess`] so mapping code is shared too.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions, MySqlQueryResult, MySqlRow},
    sqlite::{SqlitePool, SqlitePoolOptions, SqliteQueryResult, SqliteRow},
    Row,
};
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseDriver};

/// Database pool trait that abstracts over different database backends.
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Execute a raw SQL query that doesn't return rows
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Get the database driver type
    fn driver(&self) -> DatabaseDriver;

    /// Get the underlying SQLite pool if this is a SQLite connection
    fn as_sqlite(&self) -> Option<&SqlitePool>;

    /// Get the underlying MySQL pool if this is a MySQL connection
    fn as_mysql(&self) -> Option<&MySqlPool>;
}

/// Run one query body against whichever backend the pool wraps.
///
/// The body is expanded once per driver with `$conn` bound to the concrete
/// pool, so it must compile for both `&SqlitePool` and `&MySqlPool`.
/// Must be used inside a function returning `anyhow::Result`.
macro_rules! with_pool {
    ($pool:expr, |$conn:ident| $body:expr) => {
        match $pool.driver() {
            $crate::config::DatabaseDriver::Sqlite => {
                let $conn = $pool
                    .as_sqlite()
                    .ok_or_else(|| anyhow::anyhow!("SQLite pool is not available"))?;
                $body
            }
            $crate::config::DatabaseDriver::Mysql => {
                let $conn = $pool
                    .as_mysql()
                    .ok_or_else(|| anyhow::anyhow!("MySQL pool is not available"))?;
                $body
            }
        }
    };
}
pub(crate) use with_pool;

/// Id of the row created by an INSERT, for either backend
pub trait LastInsertId {
    fn last_id(&self) -> i64;
}

impl LastInsertId for SqliteQueryResult {
    fn last_id(&self) -> i64 {
        self.last_insert_rowid()
    }
}

impl LastInsertId for MySqlQueryResult {
    fn last_id(&self) -> i64 {
        self.last_insert_id() as i64
    }
}

/// Typed column access shared by SQLite and MySQL rows
pub trait RowAccess {
    fn text(&self, column: &str) -> Result<String>;
    fn opt_text(&self, column: &str) -> Result<Option<String>>;
    fn int(&self, column: &str) -> Result<i64>;
    fn opt_int(&self, column: &str) -> Result<Option<i64>>;
    fn flag(&self, column: &str) -> Result<bool>;
    fn timestamp(&self, column: &str) -> Result<DateTime<Utc>>;
    fn opt_timestamp(&self, column: &str) -> Result<Option<DateTime<Utc>>>;
}

macro_rules! impl_row_access {
    ($row:ty) => {
        impl RowAccess for $row {
            fn text(&self, column: &str) -> Result<String> {
                self.try_get(column)
                    .with_context(|| format!("Failed to read column {}", column))
            }

            fn opt_text(&self, column: &str) -> Result<Option<String>> {
                self.try_get(column)
                    .with_context(|| format!("Failed to read column {}", column))
            }

            fn int(&self, column: &str) -> Result<i64> {
                self.try_get(column)
                    .with_context(|| format!("Failed to read column {}", column))
            }

            fn opt_int(&self, column: &str) -> Result<Option<i64>> {
                self.try_get(column)
                    .with_context(|| format!("Failed to read column {}", column))
            }

            fn flag(&self, column: &str) -> Result<bool> {
                self.try_get(column)
                    .with_context(|| format!("Failed to read column {}", column))
            }

            fn timestamp(&self, column: &str) -> Result<DateTime<Utc>> {
                self.try_get(column)
                    .with_context(|| format!("Failed to read column {}", column))
            }

            fn opt_timestamp(&self, column: &str) -> Result<Option<DateTime<Utc>>> {
                self.try_get(column)
                    .with_context(|| format!("Failed to read column {}", column))
            }
        }
    };
}

impl_row_access!(SqliteRow);
impl_row_access!(MySqlRow);

/// SQLite connection pool implementation
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Create a new SQLite connection pool
    pub async fn new(url: &str) -> Result<Self> {
        let in_memory = url.starts_with(":memory:") || url.starts_with("sqlite::memory:");

        // Ensure the database directory exists for file-based SQLite
        if !in_memory {
            let path = url.trim_start_matches("sqlite:");

            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
                }
            }
        }

        let connection_url = if url.starts_with("sqlite:") {
            if url.contains('?') {
                url.to_string()
            } else {
                format!("{}?mode=rwc", url)
            }
        } else if url == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", url)
        };

        // Every in-memory connection is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 20 })
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .context("Failed to enable foreign keys")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Sqlite
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        Some(&self.pool)
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        None
    }
}

/// MySQL connection pool implementation
pub struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    /// Create a new MySQL connection pool
    pub async fn new(url: &str) -> Result<Self> {
        let connection_url = if url.starts_with("mysql://") {
            url.to_string()
        } else {
            format!("mysql://{}", url)
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(30)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to MySQL database: {}", url))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabasePool for MysqlDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mysql
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        None
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        Some(&self.pool)
    }
}

/// Type alias for a boxed database pool
pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// Create a database connection pool based on configuration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    match config.driver {
        DatabaseDriver::Sqlite => {
            let db = SqliteDatabase::new(&config.url).await?;
            Ok(Arc::new(db))
        }
        DatabaseDriver::Mysql => {
            let db = MysqlDatabase::new(&config.url).await?;
            Ok(Arc::new(db))
        }
    }
}

/// Create a SQLite in-memory database pool for testing
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    let config = DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
    };
    create_pool(&config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_pool_creation() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        assert_eq!(pool.driver(), DatabaseDriver::Sqlite);
        assert!(pool.as_sqlite().is_some());
        assert!(pool.as_mysql().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_nested_directory_creation() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("dir").join("test.db");

        let config = DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url: db_path.to_string_lossy().to_string(),
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        pool.execute("CREATE TABLE t (id INTEGER)").await.expect("Write should succeed");
        assert!(db_path.exists());
    }

    async fn insert_and_read(pool: &DynDatabasePool) -> Result<(i64, String, bool, Option<i64>)> {
        pool.execute("CREATE TABLE samples (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, ok BOOLEAN, parent INTEGER)")
            .await?;

        with_pool!(pool, |conn| {
            let result = sqlx::query("INSERT INTO samples (name, ok, parent) VALUES (?, ?, ?)")
                .bind("first")
                .bind(true)
                .bind(None::<i64>)
                .execute(conn)
                .await?;
            let id = result.last_id();

            let row = sqlx::query("SELECT id, name, ok, parent FROM samples WHERE id = ?")
                .bind(id)
                .fetch_one(conn)
                .await?;
            Ok((row.int("id")?, row.text("name")?, row.flag("ok")?, row.opt_int("parent")?))
        })
    }

    #[tokio::test]
    async fn test_with_pool_dispatch_and_row_access() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        let (id, name, ok, parent) = insert_and_read(&pool).await.expect("round trip query");

        assert_eq!(id, 1);
        assert_eq!(name, "first");
        assert!(ok);
        assert_eq!(parent, None);
    }

    #[tokio::test]
    #[ignore = "Requires MySQL server"]
    async fn test_mysql_pool_creation() {
        let url = std::env::var("MYSQL_TEST_URL")
            .unwrap_or_else(|_| "mysql://root@localhost/test".to_string());

        let config = DatabaseConfig {
            driver: DatabaseDriver::Mysql,
            url,
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        assert_eq!(pool.driver(), DatabaseDriver::Mysql);
        assert!(pool.as_mysql().is_some());
    }
}
