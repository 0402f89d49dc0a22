//! Club application service
//!
//! Students apply to clubs; admins and the club's head review. Approval
//! makes the applicant a member of the club.

use anyhow::Context;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::repositories::{ClubApplicationRepository, ClubRepository, UserRepository};
use crate::models::{
    AdditionalRole, ApplicationStatus, Club, ClubApplication, ClubApplicationView, User,
};
use crate::services::validation::non_blank;

/// Error types for club application operations
#[derive(Debug, thiserror::Error)]
pub enum ClubApplicationServiceError {
    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

type Result<T> = std::result::Result<T, ClubApplicationServiceError>;

pub struct ClubApplicationService {
    application_repo: Arc<dyn ClubApplicationRepository>,
    club_repo: Arc<dyn ClubRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl ClubApplicationService {
    pub fn new(
        application_repo: Arc<dyn ClubApplicationRepository>,
        club_repo: Arc<dyn ClubRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            application_repo,
            club_repo,
            user_repo,
        }
    }

    /// Every application, newest first
    pub async fn list_all(&self) -> Result<Vec<ClubApplicationView>> {
        Ok(self
            .application_repo
            .list_all()
            .await
            .context("Failed to list club applications")?)
    }

    /// Applications to the club the actor heads, together with that club
    pub async fn for_club_head(&self, actor: &User) -> Result<(Vec<ClubApplicationView>, Club)> {
        if !actor.is_club_head() {
            return Err(ClubApplicationServiceError::Forbidden(
                "Only club heads can access this route".to_string(),
            ));
        }
        let club_id = actor.club_id.ok_or_else(|| {
            ClubApplicationServiceError::ValidationError("You are not assigned to any club".to_string())
        })?;

        let club = self.get_club(club_id).await?;
        let applications = self
            .application_repo
            .list_by_club(club_id)
            .await
            .context("Failed to list club applications")?;
        Ok((applications, club))
    }

    /// The actor's own applications, newest first
    pub async fn mine(&self, actor: &User) -> Result<Vec<ClubApplicationView>> {
        Ok(self
            .application_repo
            .list_by_student(actor.id)
            .await
            .context("Failed to list applications")?)
    }

    /// Apply to a club. One pending or approved application per club.
    pub async fn apply(
        &self,
        actor: &User,
        club_id: Option<i64>,
        reason: Option<&str>,
    ) -> Result<ClubApplicationView> {
        let (Some(club_id), Some(reason)) = (club_id, non_blank(reason)) else {
            return Err(ClubApplicationServiceError::ValidationError(
                "Please provide club and reason".to_string(),
            ));
        };

        self.get_club(club_id).await?;

        if self
            .application_repo
            .find_active(club_id, actor.id)
            .await
            .context("Failed to check existing applications")?
            .is_some()
        {
            return Err(ClubApplicationServiceError::ValidationError(
                "You have already applied to this club or are already a member".to_string(),
            ));
        }

        let created = self
            .application_repo
            .create(&ClubApplication::new(club_id, actor.id, reason))
            .await
            .context("Failed to create club application")?;

        tracing::info!(application_id = created.id, club_id, student_id = actor.id, "Club application submitted");
        self.get_view(created.id).await
    }

    /// Approve or reject an application. Approval grants the student the
    /// club_member role and assigns them to the club.
    pub async fn review(&self, actor: &User, id: i64, status: &str) -> Result<ClubApplicationView> {
        let status = ApplicationStatus::from_str(status)
            .ok()
            .filter(ApplicationStatus::is_decision)
            .ok_or_else(|| ClubApplicationServiceError::ValidationError("Invalid status".to_string()))?;

        let mut application = self
            .application_repo
            .get_by_id(id)
            .await
            .context("Failed to get club application")?
            .ok_or_else(|| ClubApplicationServiceError::NotFound("Application not found".to_string()))?;

        if !actor.can_review_applications_for(application.club_id) {
            return Err(ClubApplicationServiceError::Forbidden(
                "Not authorized to review this application".to_string(),
            ));
        }

        application.review(status, actor.id);
        self.application_repo
            .update(&application)
            .await
            .context("Failed to update club application")?;

        if status == ApplicationStatus::Approved {
            self.grant_membership(application.student_id, application.club_id).await?;
        }

        tracing::info!(application_id = id, status = %status, reviewed_by = actor.id, "Club application reviewed");
        self.get_view(id).await
    }

    async fn grant_membership(&self, student_id: i64, club_id: i64) -> Result<()> {
        let Some(mut student) = self
            .user_repo
            .get_by_id(student_id)
            .await
            .context("Failed to get applicant")?
        else {
            tracing::warn!(student_id, "Approved applicant no longer exists");
            return Ok(());
        };

        student.grant_additional_role(AdditionalRole::ClubMember);
        student.club_id = Some(club_id);
        self.user_repo.update(&student).await.context("Failed to update applicant")?;
        Ok(())
    }

    async fn get_club(&self, id: i64) -> Result<Club> {
        self.club_repo
            .get_by_id(id)
            .await
            .context("Failed to get club")?
            .ok_or_else(|| ClubApplicationServiceError::NotFound("Club not found".to_string()))
    }

    async fn get_view(&self, id: i64) -> Result<ClubApplicationView> {
        self.application_repo
            .get_view(id)
            .await
            .context("Failed to get club application")?
            .ok_or_else(|| ClubApplicationServiceError::NotFound("Application not found".to_string()))
    }
}
