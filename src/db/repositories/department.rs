//! Department repository
//!
//! Database operations for departments.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::db::{with_pool, DynDatabasePool, LastInsertId, RowAccess};
use crate::models::{Department, DepartmentSummary};

/// Department repository trait
#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    /// Create a new department
    async fn create(&self, department: &Department) -> Result<Department>;

    /// Get department by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Department>>;

    /// Find a department whose name or code collides with the given ones
    async fn find_conflict(&self, name: &str, code: &str) -> Result<Option<Department>>;

    /// List all departments sorted by name
    async fn list(&self) -> Result<Vec<Department>>;
}

/// SQLx-based department repository implementation
pub struct SqlxDepartmentRepository {
    pool: DynDatabasePool,
}

impl SqlxDepartmentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn DepartmentRepository> {
        Arc::new(Self::new(pool))
    }
}

const DEPARTMENT_COLUMNS: &str = "id, name, code, description, created_at";

#[async_trait]
impl DepartmentRepository for SqlxDepartmentRepository {
    async fn create(&self, department: &Department) -> Result<Department> {
        with_pool!(self.pool, |conn| {
            let result = sqlx::query(
                "INSERT INTO departments (name, code, description, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&department.name)
            .bind(&department.code)
            .bind(&department.description)
            .bind(department.created_at)
            .execute(conn)
            .await
            .context("Failed to create department")?;

            Ok(Department {
                id: result.last_id(),
                ..department.clone()
            })
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Department>> {
        let query = format!("SELECT {} FROM departments WHERE id = ?", DEPARTMENT_COLUMNS);
        with_pool!(self.pool, |conn| {
            let row = sqlx::query(&query)
                .bind(id)
                .fetch_optional(conn)
                .await
                .context("Failed to get department by ID")?;
            row.as_ref().map(row_to_department).transpose()
        })
    }

    async fn find_conflict(&self, name: &str, code: &str) -> Result<Option<Department>> {
        let query = format!(
            "SELECT {} FROM departments WHERE name = ? OR code = ? LIMIT 1",
            DEPARTMENT_COLUMNS
        );
        with_pool!(self.pool, |conn| {
            let row = sqlx::query(&query)
                .bind(name)
                .bind(code)
                .fetch_optional(conn)
                .await
                .context("Failed to look up department")?;
            row.as_ref().map(row_to_department).transpose()
        })
    }

    async fn list(&self) -> Result<Vec<Department>> {
        let query = format!("SELECT {} FROM departments ORDER BY name ASC", DEPARTMENT_COLUMNS);
        with_pool!(self.pool, |conn| {
            let rows = sqlx::query(&query)
                .fetch_all(conn)
                .await
                .context("Failed to list departments")?;
            rows.iter().map(row_to_department).collect()
        })
    }
}

fn row_to_department<R: RowAccess>(row: &R) -> Result<Department> {
    Ok(Department {
        id: row.int("id")?,
        name: row.text("name")?,
        code: row.text("code")?,
        description: row.opt_text("description")?,
        created_at: row.timestamp("created_at")?,
    })
}

/// Read a joined department summary. Returns None when the join found nothing.
pub(crate) fn department_summary<R: RowAccess>(
    row: &R,
    id_column: &str,
    name_column: &str,
    code_column: &str,
) -> Result<Option<DepartmentSummary>> {
    match (row.opt_int(id_column)?, row.opt_text(name_column)?) {
        (Some(id), Some(name)) => Ok(Some(DepartmentSummary {
            id,
            name,
            code: row.opt_text(code_column)?.unwrap_or_default(),
        })),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxDepartmentRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxDepartmentRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_department() {
        let repo = setup_test_repo().await;
        let dept = Department::new("Computer Science".to_string(), "cse".to_string(), None);

        let created = repo.create(&dept).await.expect("Failed to create department");
        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get department")
            .expect("Department not found");
        assert_eq!(found.code, "CSE");
        assert_eq!(found.name, "Computer Science");
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let repo = setup_test_repo().await;
        for (name, code) in [("Physics", "PHY"), ("Civil", "CIV"), ("Mechanical", "MEC")] {
            repo.create(&Department::new(name.to_string(), code.to_string(), None))
                .await
                .expect("Failed to create department");
        }

        let names: Vec<String> = repo
            .list()
            .await
            .expect("Failed to list")
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Civil", "Mechanical", "Physics"]);
    }

    #[tokio::test]
    async fn test_find_conflict_by_name_or_code() {
        let repo = setup_test_repo().await;
        repo.create(&Department::new("Physics".to_string(), "PHY".to_string(), None))
            .await
            .expect("Failed to create department");

        assert!(repo.find_conflict("Physics", "XYZ").await.unwrap().is_some());
        assert!(repo.find_conflict("Other", "PHY").await.unwrap().is_some());
        assert!(repo.find_conflict("Other", "XYZ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected_by_schema() {
        let repo = setup_test_repo().await;
        repo.create(&Department::new("Physics".to_string(), "PHY".to_string(), None))
            .await
            .expect("Failed to create department");

        let result = repo
            .create(&Department::new("Physics II".to_string(), "PHY".to_string(), None))
            .await;
        assert!(result.is_err());
    }
}
