//! Club repository
//!
//! Database operations for clubs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::{with_pool, DynDatabasePool, LastInsertId, RowAccess};
use crate::models::{Club, ClubCategory, ClubSummary};

/// Club repository trait
#[async_trait]
pub trait ClubRepository: Send + Sync {
    /// Create a new club
    async fn create(&self, club: &Club) -> Result<Club>;

    /// Get club by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Club>>;

    /// Get club by its exact name
    async fn get_by_name(&self, name: &str) -> Result<Option<Club>>;

    /// List all clubs sorted by name
    async fn list(&self) -> Result<Vec<Club>>;
}

/// SQLx-based club repository implementation
pub struct SqlxClubRepository {
    pool: DynDatabasePool,
}

impl SqlxClubRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ClubRepository> {
        Arc::new(Self::new(pool))
    }
}

const CLUB_COLUMNS: &str = "id, name, category, description, created_at";

#[async_trait]
impl ClubRepository for SqlxClubRepository {
    async fn create(&self, club: &Club) -> Result<Club> {
        with_pool!(self.pool, |conn| {
            let result = sqlx::query(
                "INSERT INTO clubs (name, category, description, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&club.name)
            .bind(club.category.as_str())
            .bind(&club.description)
            .bind(club.created_at)
            .execute(conn)
            .await
            .context("Failed to create club")?;

            Ok(Club {
                id: result.last_id(),
                ..club.clone()
            })
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Club>> {
        let query = format!("SELECT {} FROM clubs WHERE id = ?", CLUB_COLUMNS);
        with_pool!(self.pool, |conn| {
            let row = sqlx::query(&query)
                .bind(id)
                .fetch_optional(conn)
                .await
                .context("Failed to get club by ID")?;
            row.as_ref().map(row_to_club).transpose()
        })
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Club>> {
        let query = format!("SELECT {} FROM clubs WHERE name = ?", CLUB_COLUMNS);
        with_pool!(self.pool, |conn| {
            let row = sqlx::query(&query)
                .bind(name)
                .fetch_optional(conn)
                .await
                .context("Failed to get club by name")?;
            row.as_ref().map(row_to_club).transpose()
        })
    }

    async fn list(&self) -> Result<Vec<Club>> {
        let query = format!("SELECT {} FROM clubs ORDER BY name ASC", CLUB_COLUMNS);
        with_pool!(self.pool, |conn| {
            let rows = sqlx::query(&query)
                .fetch_all(conn)
                .await
                .context("Failed to list clubs")?;
            rows.iter().map(row_to_club).collect()
        })
    }
}

fn row_to_club<R: RowAccess>(row: &R) -> Result<Club> {
    Ok(Club {
        id: row.int("id")?,
        name: row.text("name")?,
        category: ClubCategory::from_str(&row.text("category")?)?,
        description: row.opt_text("description")?,
        created_at: row.timestamp("created_at")?,
    })
}

/// Read a joined club summary. Returns None when the join found nothing.
pub(crate) fn club_summary<R: RowAccess>(
    row: &R,
    id_column: &str,
    name_column: &str,
    category_column: &str,
) -> Result<Option<ClubSummary>> {
    match (row.opt_int(id_column)?, row.opt_text(name_column)?) {
        (Some(id), Some(name)) => {
            let category = match row.opt_text(category_column)? {
                Some(category) => ClubCategory::from_str(&category)?,
                None => ClubCategory::default(),
            };
            Ok(Some(ClubSummary { id, name, category }))
        }
        _ => Ok(None),
    }
}

/// Read a fully joined club; every column is aliased with `prefix`.
pub(crate) fn prefixed_club<R: RowAccess>(row: &R, prefix: &str) -> Result<Club> {
    let column = |name: &str| format!("{}{}", prefix, name);
    Ok(Club {
        id: row.int(&column("id"))?,
        name: row.text(&column("name"))?,
        category: ClubCategory::from_str(&row.text(&column("category"))?)?,
        description: row.opt_text(&column("description"))?,
        created_at: row.timestamp(&column("created_at"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxClubRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxClubRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_club() {
        let repo = setup_test_repo().await;
        let club = Club::new(
            "Robotics".to_string(),
            ClubCategory::Technical,
            Some("Build robots".to_string()),
        );

        let created = repo.create(&club).await.expect("Failed to create club");
        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get club")
            .expect("Club not found");
        assert_eq!(found.category, ClubCategory::Technical);
        assert_eq!(found.description.as_deref(), Some("Build robots"));

        let by_name = repo.get_by_name("Robotics").await.expect("lookup");
        assert_eq!(by_name.map(|c| c.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let repo = setup_test_repo().await;
        for name in ["Music", "Chess", "Drama"] {
            repo.create(&Club::new(name.to_string(), ClubCategory::Cultural, None))
                .await
                .expect("Failed to create club");
        }

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Chess", "Drama", "Music"]);
    }

    #[tokio::test]
    async fn test_get_missing_club() {
        let repo = setup_test_repo().await;
        assert!(repo.get_by_id(42).await.unwrap().is_none());
        assert!(repo.get_by_name("Nope").await.unwrap().is_none());
    }
}
