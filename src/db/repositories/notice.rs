//! Notice repository
//!
//! Database operations for notices. Listings join the author, department
//! and club so handlers can return populated notices in one query.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;

use super::club::club_summary;
use super::department::department_summary;
use crate::db::{with_pool, DynDatabasePool, LastInsertId, RowAccess};
use crate::models::{
    Author, Notice, NoticeFilter, NoticeFormat, NoticeType, NoticeView, PdfFile, UserRole,
};

/// Notice repository trait
#[async_trait]
pub trait NoticeRepository: Send + Sync {
    /// Create a new notice
    async fn create(&self, notice: &Notice) -> Result<Notice>;

    /// Get notice by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Notice>>;

    /// Get notice by ID with author, department and club populated
    async fn get_view(&self, id: i64) -> Result<Option<NoticeView>>;

    /// List notices matching the filter, pinned first, then newest first
    async fn list(&self, filter: &NoticeFilter) -> Result<Vec<NoticeView>>;

    /// Update a notice. Bumps `updated_at`.
    async fn update(&self, notice: &Notice) -> Result<Notice>;

    /// Delete a notice
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based notice repository implementation
pub struct SqlxNoticeRepository {
    pool: DynDatabasePool,
}

impl SqlxNoticeRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NoticeRepository> {
        Arc::new(Self::new(pool))
    }
}

const NOTICE_COLUMNS: &str = "n.id, n.title, n.content, n.notice_type, n.format, \
     n.pdf_filename, n.pdf_path, n.pdf_size, n.department_id, n.club_id, n.posted_by, \
     n.is_active, n.is_pinned, n.created_at, n.updated_at";

const VIEW_JOINS: &str = "u.name AS author_name, u.role AS author_role, \
     d.name AS department_name, d.code AS department_code, \
     c.name AS club_name, c.category AS club_category \
     FROM notices n \
     INNER JOIN users u ON u.id = n.posted_by \
     LEFT JOIN departments d ON d.id = n.department_id \
     LEFT JOIN clubs c ON c.id = n.club_id";

const LIST_ORDER: &str = "ORDER BY n.is_pinned DESC, n.created_at DESC, n.id DESC";

/// Bind value for dynamically built listing queries
#[derive(Debug, Clone, PartialEq)]
enum Param {
    Int(i64),
    Text(&'static str),
}

/// Build the WHERE clause and its bind values for a listing filter.
fn filter_clause(filter: &NoticeFilter) -> (String, Vec<Param>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if let Some(notice_type) = filter.notice_type {
        conditions.push("n.notice_type = ?".to_string());
        params.push(Param::Text(notice_type.as_str()));
    }
    if let Some(department_id) = filter.department_id {
        conditions.push("n.department_id = ?".to_string());
        params.push(Param::Int(department_id));
    }
    if let Some(club_id) = filter.club_id {
        conditions.push("n.club_id = ?".to_string());
        params.push(Param::Int(club_id));
    }
    if let Some(scope) = filter.student_scope {
        match scope {
            Some(department_id) => {
                conditions.push(
                    "(n.notice_type <> 'academic' OR n.department_id IS NULL OR n.department_id = ?)"
                        .to_string(),
                );
                params.push(Param::Int(department_id));
            }
            None => conditions
                .push("(n.notice_type <> 'academic' OR n.department_id IS NULL)".to_string()),
        }
    }

    if conditions.is_empty() {
        (String::new(), params)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), params)
    }
}

#[async_trait]
impl NoticeRepository for SqlxNoticeRepository {
    async fn create(&self, notice: &Notice) -> Result<Notice> {
        let now = Utc::now();
        let pdf = notice.pdf_file.as_ref();

        with_pool!(self.pool, |conn| {
            let result = sqlx::query(
                r#"
                INSERT INTO notices (title, content, notice_type, format, pdf_filename, pdf_path,
                                     pdf_size, department_id, club_id, posted_by, is_active,
                                     is_pinned, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&notice.title)
            .bind(&notice.content)
            .bind(notice.notice_type.as_str())
            .bind(notice.format.as_str())
            .bind(pdf.map(|p| p.filename.as_str()))
            .bind(pdf.map(|p| p.path.as_str()))
            .bind(pdf.map(|p| p.size))
            .bind(notice.department_id)
            .bind(notice.club_id)
            .bind(notice.posted_by)
            .bind(notice.is_active)
            .bind(notice.is_pinned)
            .bind(now)
            .bind(now)
            .execute(conn)
            .await
            .context("Failed to create notice")?;

            Ok(Notice {
                id: result.last_id(),
                created_at: now,
                updated_at: now,
                ..notice.clone()
            })
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Notice>> {
        let query = format!("SELECT {} FROM notices n WHERE n.id = ?", NOTICE_COLUMNS);
        with_pool!(self.pool, |conn| {
            let row = sqlx::query(&query)
                .bind(id)
                .fetch_optional(conn)
                .await
                .context("Failed to get notice by ID")?;
            row.as_ref().map(row_to_notice).transpose()
        })
    }

    async fn get_view(&self, id: i64) -> Result<Option<NoticeView>> {
        let query = format!("SELECT {}, {} WHERE n.id = ?", NOTICE_COLUMNS, VIEW_JOINS);
        with_pool!(self.pool, |conn| {
            let row = sqlx::query(&query)
                .bind(id)
                .fetch_optional(conn)
                .await
                .context("Failed to get notice")?;
            row.as_ref().map(row_to_view).transpose()
        })
    }

    async fn list(&self, filter: &NoticeFilter) -> Result<Vec<NoticeView>> {
        let (clause, params) = filter_clause(filter);
        let query = format!("SELECT {}, {} {} {}", NOTICE_COLUMNS, VIEW_JOINS, clause, LIST_ORDER);

        with_pool!(self.pool, |conn| {
            let mut q = sqlx::query(&query);
            for param in &params {
                q = match param {
                    Param::Int(value) => q.bind(*value),
                    Param::Text(value) => q.bind(*value),
                };
            }
            let rows = q.fetch_all(conn).await.context("Failed to list notices")?;
            rows.iter().map(row_to_view).collect()
        })
    }

    async fn update(&self, notice: &Notice) -> Result<Notice> {
        let now = Utc::now();
        let pdf = notice.pdf_file.as_ref();

        with_pool!(self.pool, |conn| {
            sqlx::query(
                r#"
                UPDATE notices
                SET title = ?, content = ?, notice_type = ?, format = ?, pdf_filename = ?,
                    pdf_path = ?, pdf_size = ?, department_id = ?, club_id = ?, is_active = ?,
                    is_pinned = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&notice.title)
            .bind(&notice.content)
            .bind(notice.notice_type.as_str())
            .bind(notice.format.as_str())
            .bind(pdf.map(|p| p.filename.as_str()))
            .bind(pdf.map(|p| p.path.as_str()))
            .bind(pdf.map(|p| p.size))
            .bind(notice.department_id)
            .bind(notice.club_id)
            .bind(notice.is_active)
            .bind(notice.is_pinned)
            .bind(now)
            .bind(notice.id)
            .execute(conn)
            .await
            .context("Failed to update notice")?;

            Ok(Notice {
                updated_at: now,
                ..notice.clone()
            })
        })
    }

    async fn delete(&self, id: i64) -> Result<()> {
        with_pool!(self.pool, |conn| {
            sqlx::query("DELETE FROM notices WHERE id = ?")
                .bind(id)
                .execute(conn)
                .await
                .context("Failed to delete notice")?;
            Ok(())
        })
    }
}

fn row_to_notice<R: RowAccess>(row: &R) -> Result<Notice> {
    let pdf_file = match row.opt_text("pdf_filename")? {
        Some(filename) => Some(PdfFile {
            filename,
            path: row.opt_text("pdf_path")?.unwrap_or_default(),
            size: row.opt_int("pdf_size")?.unwrap_or(0),
        }),
        None => None,
    };

    Ok(Notice {
        id: row.int("id")?,
        title: row.text("title")?,
        content: row.text("content")?,
        notice_type: NoticeType::from_str(&row.text("notice_type")?)?,
        format: NoticeFormat::from_str(&row.text("format")?)?,
        pdf_file,
        department_id: row.opt_int("department_id")?,
        club_id: row.opt_int("club_id")?,
        posted_by: row.int("posted_by")?,
        is_active: row.flag("is_active")?,
        is_pinned: row.flag("is_pinned")?,
        created_at: row.timestamp("created_at")?,
        updated_at: row.timestamp("updated_at")?,
    })
}

fn row_to_view<R: RowAccess>(row: &R) -> Result<NoticeView> {
    let notice = row_to_notice(row)?;
    let posted_by = Author {
        id: notice.posted_by,
        name: row.text("author_name")?,
        role: UserRole::from_str(&row.text("author_role")?)?,
    };

    Ok(NoticeView {
        posted_by,
        department: department_summary(row, "department_id", "department_name", "department_code")?,
        club: club_summary(row, "club_id", "club_name", "club_category")?,
        notice,
    })
}
