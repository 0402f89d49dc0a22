//! Database layer
//!
//! This module provides database abstraction for the notice board.
//! It supports:
//! - SQLite (default, for single-binary deployment)
//! - MySQL (for larger deployments)
//!
//! The database driver is selected based on configuration.
//!
//! # Usage
//!
//! ```ignore
//! use noticeboard::config::DatabaseConfig;
//! use noticeboard::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub(crate) use pool::with_pool;
pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, LastInsertId, MysqlDatabase,
    RowAccess, SqliteDatabase,
};
