//! User repository
//!
//! Database operations for users.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL
//!
//! Profiles are read with the user's department and club joined in.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;

use super::club::club_summary;
use super::department::department_summary;
use crate::db::{with_pool, DynDatabasePool, LastInsertId, RowAccess};
use crate::models::{AdditionalRole, User, UserProfile, UserRole};

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get user by ID with department and club populated
    async fn get_profile(&self, id: i64) -> Result<Option<UserProfile>>;

    /// List all users with department and club populated, newest first
    async fn list_profiles(&self) -> Result<Vec<UserProfile>>;

    /// List users belonging to a club, sorted by name
    async fn list_by_club(&self, club_id: i64) -> Result<Vec<UserProfile>>;

    /// Update a user. Bumps `updated_at`.
    async fn update(&self, user: &User) -> Result<User>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

const USER_COLUMNS: &str = "u.id, u.name, u.email, u.password_hash, u.role, u.additional_roles, \
     u.department_id, u.club_id, u.can_post, u.created_at, u.updated_at";

const PROFILE_JOINS: &str = "d.name AS department_name, d.code AS department_code, \
     c.name AS club_name, c.category AS club_category \
     FROM users u \
     LEFT JOIN departments d ON d.id = u.department_id \
     LEFT JOIN clubs c ON c.id = u.club_id";

fn profile_query(tail: &str) -> String {
    format!("SELECT {}, {} {}", USER_COLUMNS, PROFILE_JOINS, tail)
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let now = Utc::now();
        let additional_roles = encode_additional_roles(&user.additional_roles)?;

        with_pool!(self.pool, |conn| {
            let result = sqlx::query(
                r#"
                INSERT INTO users (name, email, password_hash, role, additional_roles,
                                   department_id, club_id, can_post, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(&additional_roles)
            .bind(user.department_id)
            .bind(user.club_id)
            .bind(user.can_post)
            .bind(now)
            .bind(now)
            .execute(conn)
            .await
            .context("Failed to create user")?;

            Ok(User {
                id: result.last_id(),
                created_at: now,
                updated_at: now,
                ..user.clone()
            })
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users u WHERE u.id = ?", USER_COLUMNS);
        with_pool!(self.pool, |conn| {
            let row = sqlx::query(&query)
                .bind(id)
                .fetch_optional(conn)
                .await
                .context("Failed to get user by ID")?;
            row.as_ref().map(row_to_user).transpose()
        })
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users u WHERE u.email = ?", USER_COLUMNS);
        with_pool!(self.pool, |conn| {
            let row = sqlx::query(&query)
                .bind(email)
                .fetch_optional(conn)
                .await
                .context("Failed to get user by email")?;
            row.as_ref().map(row_to_user).transpose()
        })
    }

    async fn get_profile(&self, id: i64) -> Result<Option<UserProfile>> {
        let query = profile_query("WHERE u.id = ?");
        with_pool!(self.pool, |conn| {
            let row = sqlx::query(&query)
                .bind(id)
                .fetch_optional(conn)
                .await
                .context("Failed to get user profile")?;
            row.as_ref().map(row_to_profile).transpose()
        })
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>> {
        let query = profile_query("ORDER BY u.created_at DESC, u.id DESC");
        with_pool!(self.pool, |conn| {
            let rows = sqlx::query(&query)
                .fetch_all(conn)
                .await
                .context("Failed to list users")?;
            rows.iter().map(row_to_profile).collect()
        })
    }

    async fn list_by_club(&self, club_id: i64) -> Result<Vec<UserProfile>> {
        let query = profile_query("WHERE u.club_id = ? ORDER BY u.name ASC");
        with_pool!(self.pool, |conn| {
            let rows = sqlx::query(&query)
                .bind(club_id)
                .fetch_all(conn)
                .await
                .context("Failed to list club members")?;
            rows.iter().map(row_to_profile).collect()
        })
    }

    async fn update(&self, user: &User) -> Result<User> {
        let now = Utc::now();
        let additional_roles = encode_additional_roles(&user.additional_roles)?;

        with_pool!(self.pool, |conn| {
            sqlx::query(
                r#"
                UPDATE users
                SET name = ?, email = ?, password_hash = ?, role = ?, additional_roles = ?,
                    department_id = ?, club_id = ?, can_post = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(&additional_roles)
            .bind(user.department_id)
            .bind(user.club_id)
            .bind(user.can_post)
            .bind(now)
            .bind(user.id)
            .execute(conn)
            .await
            .context("Failed to update user")?;

            Ok(User {
                updated_at: now,
                ..user.clone()
            })
        })
    }
}

fn encode_additional_roles(roles: &[AdditionalRole]) -> Result<String> {
    serde_json::to_string(roles).context("Failed to encode additional roles")
}

fn row_to_user<R: RowAccess>(row: &R) -> Result<User> {
    let additional_roles: Vec<AdditionalRole> =
        serde_json::from_str(&row.text("additional_roles")?).context("Invalid additional_roles column")?;

    Ok(User {
        id: row.int("id")?,
        name: row.text("name")?,
        email: row.text("email")?,
        password_hash: row.text("password_hash")?,
        role: UserRole::from_str(&row.text("role")?)?,
        additional_roles,
        department_id: row.opt_int("department_id")?,
        club_id: row.opt_int("club_id")?,
        can_post: row.flag("can_post")?,
        created_at: row.timestamp("created_at")?,
        updated_at: row.timestamp("updated_at")?,
    })
}

fn row_to_profile<R: RowAccess>(row: &R) -> Result<UserProfile> {
    Ok(UserProfile {
        user: row_to_user(row)?,
        department: department_summary(row, "department_id", "department_name", "department_code")?,
        club: club_summary(row, "club_id", "club_name", "club_category")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        ClubRepository, DepartmentRepository, SqlxClubRepository, SqlxDepartmentRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Club, ClubCategory, Department};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_test_user(name: &str, email: &str, role: UserRole) -> User {
        User::new(name.to_string(), email.to_string(), "hash".to_string(), role)
    }

    #[tokio::test]
    async fn test_create_user() {
        let (_pool, repo) = setup_test_repo().await;
        let user = create_test_user("Asha", "asha@vit.edu", UserRole::Faculty);

        let created = repo.create(&user).await.expect("Failed to create user");

        assert!(created.id > 0);
        assert_eq!(created.email, "asha@vit.edu");
        assert_eq!(created.role, UserRole::Faculty);
        assert!(created.can_post);
    }

    #[tokio::test]
    async fn test_get_user_by_id_and_email() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&create_test_user("Ravi", "ravi@example.com", UserRole::Student))
            .await
            .expect("Failed to create user");

        let by_id = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(by_id.name, "Ravi");
        assert_eq!(by_id.password_hash, "hash");

        let by_email = repo
            .get_by_email("ravi@example.com")
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(by_email.id, created.id);

        assert!(repo.get_by_id(999).await.unwrap().is_none());
        assert!(repo.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_fails() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("A", "dup@example.com", UserRole::Student))
            .await
            .expect("Failed to create user");

        let result = repo
            .create(&create_test_user("B", "dup@example.com", UserRole::Student))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_persists_roles_and_flags() {
        let (_pool, repo) = setup_test_repo().await;
        let mut user = repo
            .create(&create_test_user("Mina", "mina@example.com", UserRole::Student))
            .await
            .expect("Failed to create user");

        user.can_post = true;
        user.role = UserRole::ClubMember;
        user.grant_additional_role(AdditionalRole::ClubHead);
        repo.update(&user).await.expect("Failed to update user");

        let found = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert!(found.can_post);
        assert_eq!(found.role, UserRole::ClubMember);
        assert_eq!(found.additional_roles, vec![AdditionalRole::ClubHead]);
    }

    #[tokio::test]
    async fn test_profile_populates_department_and_club() {
        let (pool, repo) = setup_test_repo().await;
        let dept = SqlxDepartmentRepository::new(pool.clone())
            .create(&Department::new("Computer Science".to_string(), "CSE".to_string(), None))
            .await
            .unwrap();
        let club = SqlxClubRepository::new(pool.clone())
            .create(&Club::new("Robotics".to_string(), ClubCategory::Technical, None))
            .await
            .unwrap();

        let mut user = create_test_user("Kiran", "kiran@example.com", UserRole::Student);
        user.department_id = Some(dept.id);
        user.club_id = Some(club.id);
        let created = repo.create(&user).await.unwrap();
        let loner = repo
            .create(&create_test_user("Solo", "solo@example.com", UserRole::Student))
            .await
            .unwrap();

        let profile = repo.get_profile(created.id).await.unwrap().unwrap();
        assert_eq!(profile.department.as_ref().map(|d| d.code.as_str()), Some("CSE"));
        assert_eq!(profile.club.as_ref().map(|c| c.name.as_str()), Some("Robotics"));

        let bare = repo.get_profile(loner.id).await.unwrap().unwrap();
        assert!(bare.department.is_none());
        assert!(bare.club.is_none());

        let members = repo.list_by_club(club.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id(), created.id);

        assert_eq!(repo.list_profiles().await.unwrap().len(), 2);
    }
}
