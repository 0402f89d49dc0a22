//! Notice model
//!
//! A notice is either academic (optionally scoped to a department) or a club
//! notice (optionally tied to a club). The body is plain text or an attached
//! PDF stored on disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Author, ClubSummary, DepartmentSummary, User};

/// Notice entity as stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    /// Unique identifier
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub notice_type: NoticeType,
    pub format: NoticeFormat,
    /// Attached PDF, present when format is pdf
    pub pdf_file: Option<PdfFile>,
    /// Department scope (academic notices only)
    pub department_id: Option<i64>,
    /// Owning club (club notices only)
    pub club_id: Option<i64>,
    /// Author user ID
    #[serde(rename = "postedById")]
    pub posted_by: i64,
    pub is_active: bool,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(
        title: String,
        content: String,
        notice_type: NoticeType,
        format: NoticeFormat,
        posted_by: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            title,
            content,
            notice_type,
            format,
            pdf_file: None,
            department_id: None,
            club_id: None,
            posted_by,
            is_active: true,
            is_pinned: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a stored PDF. Forces the pdf format.
    pub fn attach_pdf(&mut self, pdf: PdfFile) {
        self.format = NoticeFormat::Pdf;
        self.pdf_file = Some(pdf);
    }

    /// Set department and club, keeping only the one that matches the type.
    pub fn set_scope(&mut self, department_id: Option<i64>, club_id: Option<i64>) {
        match self.notice_type {
            NoticeType::Academic => {
                self.department_id = department_id;
                self.club_id = None;
            }
            NoticeType::Club => {
                self.department_id = None;
                self.club_id = club_id;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeType {
    Academic,
    Club,
}

impl NoticeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeType::Academic => "academic",
            NoticeType::Club => "club",
        }
    }
}

impl fmt::Display for NoticeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoticeType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "academic" => Ok(NoticeType::Academic),
            "club" => Ok(NoticeType::Club),
            _ => Err(anyhow::anyhow!("Invalid notice type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeFormat {
    Text,
    Pdf,
}

impl Default for NoticeFormat {
    fn default() -> Self {
        Self::Text
    }
}

impl NoticeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeFormat::Text => "text",
            NoticeFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for NoticeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoticeFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(NoticeFormat::Text),
            "pdf" => Ok(NoticeFormat::Pdf),
            _ => Err(anyhow::anyhow!("Invalid notice format: {}", s)),
        }
    }
}

/// Stored PDF attachment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfFile {
    /// Name of the file inside the upload directory
    pub filename: String,
    /// Public path, e.g. `/uploads/<filename>`
    pub path: String,
    /// Size in bytes
    pub size: i64,
}

/// Notice with author, department and club populated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeView {
    #[serde(flatten)]
    pub notice: Notice,
    pub posted_by: Author,
    pub department: Option<DepartmentSummary>,
    pub club: Option<ClubSummary>,
}

/// Input for creating a notice. Validation happens in the service; an
/// attachment travels separately.
#[derive(Debug, Clone, Default)]
pub struct CreateNoticeInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub notice_type: Option<String>,
    pub format: Option<String>,
    pub department_id: Option<i64>,
    pub club_id: Option<i64>,
}

/// Partial update. For `department_id`/`club_id` the outer Option says
/// whether the field was sent, the inner one whether it is cleared.
#[derive(Debug, Clone, Default)]
pub struct UpdateNoticeInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub notice_type: Option<String>,
    pub department_id: Option<Option<i64>>,
    pub club_id: Option<Option<i64>>,
}

/// Listing filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoticeFilter {
    pub notice_type: Option<NoticeType>,
    pub department_id: Option<i64>,
    pub club_id: Option<i64>,
    /// When set, academic notices are restricted to those with no department
    /// or with this department (None meaning the viewer has no department).
    pub student_scope: Option<Option<i64>>,
}

impl NoticeFilter {
    /// Apply department scoping for the viewer. Only students are scoped,
    /// and only when the listing can contain academic notices.
    pub fn scoped_for(mut self, viewer: &User) -> Self {
        let may_include_academic = matches!(self.notice_type, None | Some(NoticeType::Academic));
        if viewer.is_student() && may_include_academic {
            self.student_scope = Some(viewer.department_id);
        }
        self
    }
}
