//! Department service

use anyhow::Context;
use std::sync::Arc;

use crate::db::repositories::DepartmentRepository;
use crate::models::{CreateDepartmentInput, Department};
use crate::services::validation::{non_blank, ValidationErrors};

/// Error types for department operations
#[derive(Debug, thiserror::Error)]
pub enum DepartmentServiceError {
    #[error("{0}")]
    InvalidInput(ValidationErrors),

    /// Name or code already taken
    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct DepartmentService {
    repo: Arc<dyn DepartmentRepository>,
}

impl DepartmentService {
    pub fn new(repo: Arc<dyn DepartmentRepository>) -> Self {
        Self { repo }
    }

    /// All departments sorted by name
    pub async fn list(&self) -> Result<Vec<Department>, DepartmentServiceError> {
        Ok(self.repo.list().await.context("Failed to list departments")?)
    }

    /// Create a department. Name and code must both be unique.
    pub async fn create(
        &self,
        input: CreateDepartmentInput,
    ) -> Result<Department, DepartmentServiceError> {
        let name = non_blank(Some(&input.name));
        let code = non_blank(Some(&input.code));

        let mut errors = ValidationErrors::new();
        errors.check(name.is_some(), "name", "Department name is required");
        errors.check(code.is_some(), "code", "Department code is required");
        errors.into_result().map_err(DepartmentServiceError::InvalidInput)?;

        let department = Department::new(
            name.unwrap_or_default(),
            code.unwrap_or_default(),
            non_blank(input.description.as_deref()),
        );

        if self
            .repo
            .find_conflict(&department.name, &department.code)
            .await
            .context("Failed to check department uniqueness")?
            .is_some()
        {
            return Err(DepartmentServiceError::Conflict(
                "Department with this name or code already exists".to_string(),
            ));
        }

        let created = self
            .repo
            .create(&department)
            .await
            .context("Failed to create department")?;

        tracing::info!(department_id = created.id, code = %created.code, "Department created");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxDepartmentRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> DepartmentService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        DepartmentService::new(SqlxDepartmentRepository::boxed(pool))
    }

    fn input(name: &str, code: &str) -> CreateDepartmentInput {
        CreateDepartmentInput {
            name: name.to_string(),
            code: code.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_department() {
        let service = setup().await;
        let created = service
            .create(input(" Computer Science ", "cse"))
            .await
            .expect("Failed to create department");

        assert_eq!(created.name, "Computer Science");
        assert_eq!(created.code, "CSE");
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let service = setup().await;
        match service.create(input("", " ")).await {
            Err(DepartmentServiceError::InvalidInput(errors)) => assert_eq!(errors.errors().len(), 2),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let service = setup().await;
        service.create(input("Physics", "PHY")).await.unwrap();

        // Codes are compared after upper-casing
        let result = service.create(input("Applied Physics", "phy")).await;
        assert!(matches!(result, Err(DepartmentServiceError::Conflict(_))));
    }
}
