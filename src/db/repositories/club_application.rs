//! Club application repository
//!
//! Database operations for club membership applications.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

use super::club::prefixed_club;
use super::department::department_summary;
use crate::db::{with_pool, DynDatabasePool, LastInsertId, RowAccess};
use crate::models::{Applicant, ApplicationStatus, ClubApplication, ClubApplicationView, Reviewer};

/// Club application repository trait
#[async_trait]
pub trait ClubApplicationRepository: Send + Sync {
    /// Create a new application
    async fn create(&self, application: &ClubApplication) -> Result<ClubApplication>;

    /// Get application by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<ClubApplication>>;

    /// Get application by ID with club, student and reviewer populated
    async fn get_view(&self, id: i64) -> Result<Option<ClubApplicationView>>;

    /// List every application, newest first
    async fn list_all(&self) -> Result<Vec<ClubApplicationView>>;

    /// List applications to a club, newest first
    async fn list_by_club(&self, club_id: i64) -> Result<Vec<ClubApplicationView>>;

    /// List a student's applications, newest first
    async fn list_by_student(&self, student_id: i64) -> Result<Vec<ClubApplicationView>>;

    /// Find a pending or approved application by this student to this club
    async fn find_active(&self, club_id: i64, student_id: i64) -> Result<Option<ClubApplication>>;

    /// Persist status and review fields
    async fn update(&self, application: &ClubApplication) -> Result<ClubApplication>;
}

/// SQLx-based club application repository implementation
pub struct SqlxClubApplicationRepository {
    pool: DynDatabasePool,
}

impl SqlxClubApplicationRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ClubApplicationRepository> {
        Arc::new(Self::new(pool))
    }
}

const APPLICATION_COLUMNS: &str = "a.id, a.club_id, a.student_id, a.reason, a.status, \
     a.applied_at, a.reviewed_at, a.reviewed_by";

const VIEW_JOINS: &str = "c.name AS club_name, c.category AS club_category, \
     c.description AS club_description, c.created_at AS club_created_at, \
     s.name AS student_name, s.email AS student_email, s.department_id AS student_department_id, \
     sd.name AS student_department_name, sd.code AS student_department_code, \
     r.name AS reviewer_name \
     FROM club_applications a \
     INNER JOIN clubs c ON c.id = a.club_id \
     INNER JOIN users s ON s.id = a.student_id \
     LEFT JOIN departments sd ON sd.id = s.department_id \
     LEFT JOIN users r ON r.id = a.reviewed_by";

const NEWEST_FIRST: &str = "ORDER BY a.applied_at DESC, a.id DESC";

fn view_query(tail: &str) -> String {
    format!("SELECT {}, {} {}", APPLICATION_COLUMNS, VIEW_JOINS, tail)
}

#[async_trait]
impl ClubApplicationRepository for SqlxClubApplicationRepository {
    async fn create(&self, application: &ClubApplication) -> Result<ClubApplication> {
        with_pool!(self.pool, |conn| {
            let result = sqlx::query(
                r#"
                INSERT INTO club_applications (club_id, student_id, reason, status, applied_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(application.club_id)
            .bind(application.student_id)
            .bind(&application.reason)
            .bind(application.status.as_str())
            .bind(application.applied_at)
            .execute(conn)
            .await
            .context("Failed to create club application")?;

            Ok(ClubApplication {
                id: result.last_id(),
                ..application.clone()
            })
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ClubApplication>> {
        let query = format!("SELECT {} FROM club_applications a WHERE a.id = ?", APPLICATION_COLUMNS);
        with_pool!(self.pool, |conn| {
            let row = sqlx::query(&query)
                .bind(id)
                .fetch_optional(conn)
                .await
                .context("Failed to get club application")?;
            row.as_ref().map(row_to_application).transpose()
        })
    }

    async fn get_view(&self, id: i64) -> Result<Option<ClubApplicationView>> {
        let query = view_query("WHERE a.id = ?");
        with_pool!(self.pool, |conn| {
            let row = sqlx::query(&query)
                .bind(id)
                .fetch_optional(conn)
                .await
                .context("Failed to get club application")?;
            row.as_ref().map(row_to_view).transpose()
        })
    }

    async fn list_all(&self) -> Result<Vec<ClubApplicationView>> {
        let query = view_query(NEWEST_FIRST);
        with_pool!(self.pool, |conn| {
            let rows = sqlx::query(&query)
                .fetch_all(conn)
                .await
                .context("Failed to list club applications")?;
            rows.iter().map(row_to_view).collect()
        })
    }

    async fn list_by_club(&self, club_id: i64) -> Result<Vec<ClubApplicationView>> {
        let query = view_query(&format!("WHERE a.club_id = ? {}", NEWEST_FIRST));
        with_pool!(self.pool, |conn| {
            let rows = sqlx::query(&query)
                .bind(club_id)
                .fetch_all(conn)
                .await
                .context("Failed to list club applications")?;
            rows.iter().map(row_to_view).collect()
        })
    }

    async fn list_by_student(&self, student_id: i64) -> Result<Vec<ClubApplicationView>> {
        let query = view_query(&format!("WHERE a.student_id = ? {}", NEWEST_FIRST));
        with_pool!(self.pool, |conn| {
            let rows = sqlx::query(&query)
                .bind(student_id)
                .fetch_all(conn)
                .await
                .context("Failed to list student applications")?;
            rows.iter().map(row_to_view).collect()
        })
    }

    async fn find_active(&self, club_id: i64, student_id: i64) -> Result<Option<ClubApplication>> {
        let query = format!(
            "SELECT {} FROM club_applications a \
             WHERE a.club_id = ? AND a.student_id = ? AND a.status IN ({}) \
             LIMIT 1",
            APPLICATION_COLUMNS,
            blocking_statuses()
        );
        with_pool!(self.pool, |conn| {
            let row = sqlx::query(&query)
                .bind(club_id)
                .bind(student_id)
                .fetch_optional(conn)
                .await
                .context("Failed to look up existing application")?;
            row.as_ref().map(row_to_application).transpose()
        })
    }

    async fn update(&self, application: &ClubApplication) -> Result<ClubApplication> {
        with_pool!(self.pool, |conn| {
            sqlx::query(
                "UPDATE club_applications SET status = ?, reviewed_at = ?, reviewed_by = ? WHERE id = ?",
            )
            .bind(application.status.as_str())
            .bind(application.reviewed_at)
            .bind(application.reviewed_by)
            .bind(application.id)
            .execute(conn)
            .await
            .context("Failed to update club application")?;
            Ok(application.clone())
        })
    }
}

fn row_to_application<R: RowAccess>(row: &R) -> Result<ClubApplication> {
    Ok(ClubApplication {
        id: row.int("id")?,
        club_id: row.int("club_id")?,
        student_id: row.int("student_id")?,
        reason: row.text("reason")?,
        status: ApplicationStatus::from_str(&row.text("status")?)?,
        applied_at: row.timestamp("applied_at")?,
        reviewed_at: row.opt_timestamp("reviewed_at")?,
        reviewed_by: row.opt_int("reviewed_by")?,
    })
}

fn row_to_view<R: RowAccess>(row: &R) -> Result<ClubApplicationView> {
    let application = row_to_application(row)?;

    let student = Applicant {
        id: application.student_id,
        name: row.text("student_name")?,
        email: row.text("student_email")?,
        department: department_summary(
            row,
            "student_department_id",
            "student_department_name",
            "student_department_code",
        )?,
    };

    let reviewed_by = match (application.reviewed_by, row.opt_text("reviewer_name")?) {
        (Some(id), Some(name)) => Some(Reviewer { id, name }),
        _ => None,
    };

    Ok(ClubApplicationView {
        club: prefixed_club(row, "club_")?,
        student,
        reviewed_by,
        application,
    })
}

/// SQL list of the statuses that block a new application
fn blocking_statuses() -> String {
    ApplicationStatus::ALL
        .iter()
        .filter(|status| status.blocks_reapplication())
        .map(|status| format!("'{}'", status.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        ClubRepository, SqlxClubRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Club, ClubCategory, User, UserRole};

    struct Fixture {
        repo: SqlxClubApplicationRepository,
        club: Club,
        other_club: Club,
        student: User,
        admin: User,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let clubs = SqlxClubRepository::new(pool.clone());
        let club = clubs
            .create(&Club::new("Robotics".into(), ClubCategory::Technical, Some("Robots".into())))
            .await
            .unwrap();
        let other_club = clubs
            .create(&Club::new("Drama".into(), ClubCategory::Cultural, None))
            .await
            .unwrap();

        let users = SqlxUserRepository::new(pool.clone());
        let student = users
            .create(&User::new("Stu".into(), "stu@example.com".into(), "h".into(), UserRole::Student))
            .await
            .unwrap();
        let admin = users
            .create(&User::new("Root".into(), "root@example.com".into(), "h".into(), UserRole::Admin))
            .await
            .unwrap();

        Fixture {
            repo: SqlxClubApplicationRepository::new(pool),
            club,
            other_club,
            student,
            admin,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_view() {
        let fx = setup().await;
        let created = fx
            .repo
            .create(&ClubApplication::new(fx.club.id, fx.student.id, "I build robots".into()))
            .await
            .expect("Failed to create application");

        let view = fx.repo.get_view(created.id).await.unwrap().expect("missing");
        assert_eq!(view.club.name, "Robotics");
        assert_eq!(view.club.description.as_deref(), Some("Robots"));
        assert_eq!(view.student.email, "stu@example.com");
        assert!(view.student.department.is_none());
        assert!(view.reviewed_by.is_none());
        assert_eq!(view.application.status, ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn test_review_populates_reviewer() {
        let fx = setup().await;
        let mut app = fx
            .repo
            .create(&ClubApplication::new(fx.club.id, fx.student.id, "reason".into()))
            .await
            .unwrap();

        app.review(ApplicationStatus::Approved, fx.admin.id);
        fx.repo.update(&app).await.unwrap();

        let view = fx.repo.get_view(app.id).await.unwrap().unwrap();
        assert_eq!(view.application.status, ApplicationStatus::Approved);
        assert_eq!(view.reviewed_by.map(|r| r.name), Some("Root".to_string()));
        assert!(view.application.reviewed_at.is_some());
    }

    #[tokio::test]
    async fn test_find_active_ignores_rejected() {
        let fx = setup().await;
        let mut app = fx
            .repo
            .create(&ClubApplication::new(fx.club.id, fx.student.id, "reason".into()))
            .await
            .unwrap();
        assert!(fx.repo.find_active(fx.club.id, fx.student.id).await.unwrap().is_some());
        assert!(fx.repo.find_active(fx.other_club.id, fx.student.id).await.unwrap().is_none());

        app.review(ApplicationStatus::Rejected, fx.admin.id);
        fx.repo.update(&app).await.unwrap();
        assert!(fx.repo.find_active(fx.club.id, fx.student.id).await.unwrap().is_none());

        let mut other = fx
            .repo
            .create(&ClubApplication::new(fx.other_club.id, fx.student.id, "again".into()))
            .await
            .unwrap();
        other.review(ApplicationStatus::Approved, fx.admin.id);
        fx.repo.update(&other).await.unwrap();
        let found = fx.repo.find_active(fx.other_club.id, fx.student.id).await.unwrap();
        assert_eq!(found.map(|a| a.status), Some(ApplicationStatus::Approved));
    }

    #[test]
    fn test_blocking_statuses_follow_status_rules() {
        assert_eq!(blocking_statuses(), "'pending', 'approved'");
    }

    #[tokio::test]
    async fn test_list_filters() {
        let fx = setup().await;
        fx.repo
            .create(&ClubApplication::new(fx.club.id, fx.student.id, "one".into()))
            .await
            .unwrap();
        fx.repo
            .create(&ClubApplication::new(fx.other_club.id, fx.student.id, "two".into()))
            .await
            .unwrap();
        fx.repo
            .create(&ClubApplication::new(fx.club.id, fx.admin.id, "three".into()))
            .await
            .unwrap();

        let all = fx.repo.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].application.reason, "three");

        assert_eq!(fx.repo.list_by_club(fx.club.id).await.unwrap().len(), 2);
        assert_eq!(fx.repo.list_by_student(fx.student.id).await.unwrap().len(), 2);
        assert!(fx.repo.get_by_id(999).await.unwrap().is_none());
    }
}
