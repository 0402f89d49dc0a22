//! Club service

use anyhow::Context;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::repositories::ClubRepository;
use crate::models::{Club, ClubCategory, CreateClubInput};
use crate::services::validation::{non_blank, ValidationErrors};

/// Error types for club operations
#[derive(Debug, thiserror::Error)]
pub enum ClubServiceError {
    #[error("{0}")]
    InvalidInput(ValidationErrors),

    /// Club name already taken
    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct ClubService {
    repo: Arc<dyn ClubRepository>,
}

impl ClubService {
    pub fn new(repo: Arc<dyn ClubRepository>) -> Self {
        Self { repo }
    }

    /// All clubs sorted by name
    pub async fn list(&self) -> Result<Vec<Club>, ClubServiceError> {
        Ok(self.repo.list().await.context("Failed to list clubs")?)
    }

    /// Create a club. The category defaults to `other`.
    pub async fn create(&self, input: CreateClubInput) -> Result<Club, ClubServiceError> {
        let name = non_blank(Some(&input.name));

        let mut errors = ValidationErrors::new();
        errors.check(name.is_some(), "name", "Club name is required");
        let category = match non_blank(input.category.as_deref()) {
            None => Some(ClubCategory::default()),
            Some(raw) => ClubCategory::from_str(&raw).ok(),
        };
        errors.check(
            category.is_some(),
            "category",
            "Category must be one of technical, cultural, sports, social, other",
        );
        errors.into_result().map_err(ClubServiceError::InvalidInput)?;

        let club = Club::new(
            name.unwrap_or_default(),
            category.unwrap_or_default(),
            non_blank(input.description.as_deref()),
        );

        if self
            .repo
            .get_by_name(&club.name)
            .await
            .context("Failed to check club name")?
            .is_some()
        {
            return Err(ClubServiceError::Conflict(
                "Club with this name already exists".to_string(),
            ));
        }

        let created = self.repo.create(&club).await.context("Failed to create club")?;
        tracing::info!(club_id = created.id, category = %created.category, "Club created");
        Ok(created)
    }
}
