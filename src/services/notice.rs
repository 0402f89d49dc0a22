//! Notice service
//!
//! Posting, browsing, editing, pinning and deleting notices. Every operation
//! takes the acting user and checks the permission predicates on [`User`]
//! before touching storage.

use anyhow::Context;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::repositories::{ClubRepository, DepartmentRepository, NoticeRepository};
use crate::models::{
    CreateNoticeInput, Notice, NoticeFilter, NoticeFormat, NoticeType, NoticeView,
    UpdateNoticeInput, User,
};
use crate::services::upload::{UploadError, UploadStore, UploadedFile};
use crate::services::validation::{non_blank, ValidationErrors};

/// Error types for notice operations
#[derive(Debug, thiserror::Error)]
pub enum NoticeServiceError {
    #[error("{0}")]
    InvalidInput(ValidationErrors),

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<UploadError> for NoticeServiceError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io(e) => {
                Self::InternalError(anyhow::Error::new(e).context("Failed to store attachment"))
            }
            other => Self::ValidationError(other.to_string()),
        }
    }
}

/// Query parameters for listing
#[derive(Debug, Clone, Default)]
pub struct NoticeQuery {
    pub notice_type: Option<String>,
    pub department_id: Option<i64>,
    pub club_id: Option<i64>,
}

pub struct NoticeService {
    notice_repo: Arc<dyn NoticeRepository>,
    department_repo: Arc<dyn DepartmentRepository>,
    club_repo: Arc<dyn ClubRepository>,
    uploads: UploadStore,
}

impl NoticeService {
    pub fn new(
        notice_repo: Arc<dyn NoticeRepository>,
        department_repo: Arc<dyn DepartmentRepository>,
        club_repo: Arc<dyn ClubRepository>,
        uploads: UploadStore,
    ) -> Self {
        Self {
            notice_repo,
            department_repo,
            club_repo,
            uploads,
        }
    }

    /// List notices visible to the viewer, pinned first then newest first
    pub async fn list(
        &self,
        viewer: &User,
        query: NoticeQuery,
    ) -> Result<Vec<NoticeView>, NoticeServiceError> {
        let notice_type = match non_blank(query.notice_type.as_deref()) {
            Some(raw) => Some(parse_type(&raw)?),
            None => None,
        };

        let filter = NoticeFilter {
            notice_type,
            department_id: query.department_id,
            club_id: query.club_id,
            student_scope: None,
        }
        .scoped_for(viewer);

        Ok(self.notice_repo.list(&filter).await.context("Failed to list notices")?)
    }

    /// Get a single notice, subject to department scoping
    pub async fn get(&self, viewer: &User, id: i64) -> Result<NoticeView, NoticeServiceError> {
        let view = self.get_view(id).await?;
        if !viewer.can_view_notice(&view.notice) {
            return Err(NoticeServiceError::Forbidden(
                "You do not have access to this notice".to_string(),
            ));
        }
        Ok(view)
    }

    /// Post a new notice, optionally with a PDF attachment.
    ///
    /// Input is fully validated before the attachment is written, and the
    /// file is removed again if the insert fails.
    pub async fn create(
        &self,
        actor: &User,
        input: CreateNoticeInput,
        attachment: Option<UploadedFile>,
    ) -> Result<NoticeView, NoticeServiceError> {
        if !actor.may_post() {
            return Err(NoticeServiceError::Forbidden(
                "You do not have permission to post notices".to_string(),
            ));
        }

        let title = non_blank(input.title.as_deref());
        let content = non_blank(input.content.as_deref());
        let raw_type = non_blank(input.notice_type.as_deref());
        let (Some(title), Some(content), Some(raw_type)) = (title, content, raw_type) else {
            return Err(NoticeServiceError::ValidationError(
                "Please provide title, type, and content".to_string(),
            ));
        };

        let notice_type = parse_type(&raw_type)?;
        let format = match non_blank(input.format.as_deref()) {
            Some(raw) => NoticeFormat::from_str(&raw)
                .map_err(|_| NoticeServiceError::ValidationError("Invalid notice format".to_string()))?,
            None => NoticeFormat::default(),
        };
        if format == NoticeFormat::Pdf && attachment.is_none() {
            return Err(NoticeServiceError::ValidationError(
                "Please attach a PDF file for PDF notices".to_string(),
            ));
        }

        let mut notice = Notice::new(title, content, notice_type, format, actor.id);
        notice.set_scope(input.department_id, input.club_id);
        self.check_references(Some(notice.department_id), Some(notice.club_id)).await?;

        if let Some(file) = &attachment {
            self.uploads.validate(file)?;
            notice.attach_pdf(self.uploads.save(file).await?);
        }

        let created = match self.notice_repo.create(&notice).await {
            Ok(created) => created,
            Err(e) => {
                if let Some(pdf) = &notice.pdf_file {
                    if let Err(cleanup) = self.uploads.remove(pdf).await {
                        tracing::warn!(filename = %pdf.filename, error = %cleanup, "Failed to clean up attachment");
                    }
                }
                return Err(NoticeServiceError::InternalError(e.context("Failed to create notice")));
            }
        };

        tracing::info!(
            notice_id = created.id,
            posted_by = actor.id,
            notice_type = %created.notice_type,
            format = %created.format,
            "Notice posted"
        );
        self.get_view(created.id).await
    }

    /// Partially update a notice. Admins edit anything, authors their own.
    pub async fn update(
        &self,
        actor: &User,
        id: i64,
        input: UpdateNoticeInput,
    ) -> Result<NoticeView, NoticeServiceError> {
        let mut notice = self.get_notice(id).await?;
        if !actor.can_edit_notice(&notice) {
            return Err(NoticeServiceError::Forbidden(
                "Not authorized to edit this notice".to_string(),
            ));
        }

        if let Some(title) = non_blank(input.title.as_deref()) {
            notice.title = title;
        }
        if let Some(content) = non_blank(input.content.as_deref()) {
            notice.content = content;
        }
        if let Some(raw) = non_blank(input.notice_type.as_deref()) {
            notice.notice_type = parse_type(&raw)?;
        }

        self.check_references(input.department_id, input.club_id).await?;
        if let Some(department_id) = input.department_id {
            notice.department_id = department_id;
        }
        if let Some(club_id) = input.club_id {
            notice.club_id = club_id;
        }

        self.notice_repo.update(&notice).await.context("Failed to update notice")?;
        tracing::info!(notice_id = id, edited_by = actor.id, "Notice updated");
        self.get_view(id).await
    }

    /// Flip the pinned flag
    pub async fn toggle_pin(
        &self,
        actor: &User,
        id: i64,
    ) -> Result<NoticeView, NoticeServiceError> {
        if !actor.can_pin_notice() {
            return Err(NoticeServiceError::Forbidden(
                "Only admins can pin notices".to_string(),
            ));
        }

        let mut notice = self.get_notice(id).await?;
        notice.is_pinned = !notice.is_pinned;
        self.notice_repo.update(&notice).await.context("Failed to update notice")?;

        tracing::info!(notice_id = id, pinned = notice.is_pinned, "Notice pin toggled");
        self.get_view(id).await
    }

    /// Delete a notice and, best effort, its stored attachment
    pub async fn delete(&self, actor: &User, id: i64) -> Result<(), NoticeServiceError> {
        let notice = self.get_notice(id).await?;
        if !actor.can_delete_notice(&notice) {
            return Err(NoticeServiceError::Forbidden(
                "Not authorized to delete this notice".to_string(),
            ));
        }

        self.notice_repo.delete(id).await.context("Failed to delete notice")?;

        if let Some(pdf) = &notice.pdf_file {
            if let Err(e) = self.uploads.remove(pdf).await {
                tracing::warn!(notice_id = id, filename = %pdf.filename, error = %e, "Failed to delete attachment");
            }
        }

        tracing::info!(notice_id = id, deleted_by = actor.id, "Notice deleted");
        Ok(())
    }

    async fn get_notice(&self, id: i64) -> Result<Notice, NoticeServiceError> {
        self.notice_repo
            .get_by_id(id)
            .await
            .context("Failed to get notice")?
            .ok_or_else(|| NoticeServiceError::NotFound("Notice not found".to_string()))
    }

    async fn get_view(&self, id: i64) -> Result<NoticeView, NoticeServiceError> {
        self.notice_repo
            .get_view(id)
            .await
            .context("Failed to get notice")?
            .ok_or_else(|| NoticeServiceError::NotFound("Notice not found".to_string()))
    }

    /// Referenced department and club must exist. The outer Option is
    /// "was this field given", the inner one the id itself.
    async fn check_references(
        &self,
        department_id: Option<Option<i64>>,
        club_id: Option<Option<i64>>,
    ) -> Result<(), NoticeServiceError> {
        let mut errors = ValidationErrors::new();
        if let Some(Some(id)) = department_id {
            let found = self.department_repo.get_by_id(id).await.context("Failed to get department")?;
            errors.check(found.is_some(), "department", "Department not found");
        }
        if let Some(Some(id)) = club_id {
            let found = self.club_repo.get_by_id(id).await.context("Failed to get club")?;
            errors.check(found.is_some(), "club", "Club not found");
        }
        errors.into_result().map_err(NoticeServiceError::InvalidInput)
    }
}

fn parse_type(raw: &str) -> Result<NoticeType, NoticeServiceError> {
    NoticeType::from_str(raw)
        .map_err(|_| NoticeServiceError::ValidationError("Invalid notice type".to_string()))
}
