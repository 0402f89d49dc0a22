//! User service
//!
//! Implements business logic for accounts:
//! - Registration with field validation and the faculty email domain rule
//! - Login and bearer token issuing
//! - Resolving a bearer token back to a live user
//! - Admin management of posting privileges, roles and additional roles
//! - Club membership management for admins and club heads

use anyhow::Context;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::{AdminBootstrapConfig, AuthConfig};
use crate::db::repositories::{ClubRepository, DepartmentRepository, UserRepository};
use crate::models::{AdditionalRole, User, UserProfile, UserRole};
use crate::services::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::services::token::TokenService;
use crate::services::validation::{is_valid_email, ValidationErrors};

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (bad credentials, bad token, vanished user)
    #[error("{0}")]
    AuthenticationError(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// One or more fields failed validation
    #[error("{0}")]
    InvalidInput(ValidationErrors),

    /// Request is well formed but not acceptable
    #[error("{0}")]
    ValidationError(String),

    /// Email already registered
    #[error("{0}")]
    UserExists(String),

    #[error("{0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Registration input
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub department_id: Option<i64>,
    pub club_id: Option<i64>,
}

/// Login input
#[derive(Debug, Clone, Default)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Result of a successful register or login
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

/// User service for accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    department_repo: Arc<dyn DepartmentRepository>,
    club_repo: Arc<dyn ClubRepository>,
    tokens: TokenService,
    faculty_email_domain: String,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        department_repo: Arc<dyn DepartmentRepository>,
        club_repo: Arc<dyn ClubRepository>,
        auth: &AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            department_repo,
            club_repo,
            tokens: TokenService::from_config(auth),
            faculty_email_domain: auth.faculty_email_domain.clone(),
        }
    }

    fn is_faculty_email(&self, email: &str) -> bool {
        email.to_lowercase().ends_with(&self.faculty_email_domain.to_lowercase())
    }

    /// Register a new account and issue a token for it.
    ///
    /// Faculty accounts must use the faculty email domain and start with
    /// posting enabled. Admin cannot be self-assigned.
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, UserServiceError> {
        let email = input.email.trim().to_lowercase();
        let role = self.validate_register_input(&input, &email)?;

        if role == UserRole::Faculty && !self.is_faculty_email(&email) {
            return Err(UserServiceError::ValidationError(format!(
                "Faculty email must end with {}",
                self.faculty_email_domain
            )));
        }

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(
                "User already exists with this email".to_string(),
            ));
        }

        self.check_references(input.department_id, input.club_id).await?;

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let mut user = User::new(input.name.trim().to_string(), email, password_hash, role);
        user.department_id = input.department_id;
        user.club_id = input.club_id;

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = created.id, role = %created.role, "User registered");
        self.session_for(created.id).await
    }

    /// Log in with email and password
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, UserServiceError> {
        let mut errors = ValidationErrors::new();
        errors.check(is_valid_email(input.email.trim()), "email", "Please provide a valid email");
        errors.check(!input.password.is_empty(), "password", "Password is required");
        errors.into_result().map_err(UserServiceError::InvalidInput)?;

        let email = input.email.trim().to_lowercase();
        let invalid = || UserServiceError::AuthenticationError("Invalid credentials".to_string());

        let user = self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to get user by email")?
            .ok_or_else(invalid)?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !password_valid {
            tracing::debug!(user_id = user.id, "Login rejected: wrong password");
            return Err(invalid());
        }

        if user.role == UserRole::Faculty && !self.is_faculty_email(&user.email) {
            return Err(UserServiceError::Forbidden(format!(
                "Faculty email must end with {}",
                self.faculty_email_domain
            )));
        }

        tracing::info!(user_id = user.id, "User logged in");
        self.session_for(user.id).await
    }

    /// Resolve a bearer token to the current user record
    pub async fn authenticate(&self, token: &str) -> Result<User, UserServiceError> {
        let claims = self.tokens.validate(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            UserServiceError::AuthenticationError("Not authorized to access this route".to_string())
        })?;

        self.user_repo
            .get_by_id(claims.sub)
            .await
            .context("Failed to load token user")?
            .ok_or_else(|| UserServiceError::AuthenticationError("User not found".to_string()))
    }

    /// Get a user with department and club populated
    pub async fn profile(&self, id: i64) -> Result<UserProfile, UserServiceError> {
        self.user_repo
            .get_profile(id)
            .await
            .context("Failed to get user profile")?
            .ok_or_else(|| UserServiceError::NotFound("User not found".to_string()))
    }

    /// List every user, newest first
    pub async fn list(&self) -> Result<Vec<UserProfile>, UserServiceError> {
        Ok(self.user_repo.list_profiles().await.context("Failed to list users")?)
    }

    /// Grant or revoke the posting privilege
    pub async fn set_can_post(&self, id: i64, can_post: bool) -> Result<UserProfile, UserServiceError> {
        let mut user = self.get_user(id).await?;
        user.can_post = can_post;
        self.user_repo.update(&user).await.context("Failed to update user")?;

        tracing::info!(user_id = id, can_post, "Posting privilege changed");
        self.profile(id).await
    }

    /// Change a user's primary role
    pub async fn set_role(&self, id: i64, role: &str) -> Result<UserProfile, UserServiceError> {
        let role = UserRole::from_str(role)
            .map_err(|_| UserServiceError::ValidationError("Invalid role".to_string()))?;

        let mut user = self.get_user(id).await?;
        user.role = role;
        self.user_repo.update(&user).await.context("Failed to update user")?;

        tracing::info!(user_id = id, role = %role, "User role changed");
        self.profile(id).await
    }

    /// Replace a user's additional roles, optionally assigning their club
    pub async fn set_additional_roles(
        &self,
        id: i64,
        roles: &[String],
        club_id: Option<i64>,
    ) -> Result<UserProfile, UserServiceError> {
        let mut parsed = Vec::new();
        for role in roles {
            let role = AdditionalRole::from_str(role).map_err(|_| {
                UserServiceError::ValidationError(format!("Invalid additional role: {}", role))
            })?;
            if !parsed.contains(&role) {
                parsed.push(role);
            }
        }

        let mut user = self.get_user(id).await?;
        if let Some(club_id) = club_id {
            self.check_references(None, Some(club_id)).await?;
            user.club_id = Some(club_id);
        }
        user.additional_roles = parsed;
        self.user_repo.update(&user).await.context("Failed to update user")?;

        tracing::info!(user_id = id, roles = ?user.additional_roles, club_id = ?user.club_id, "Additional roles changed");
        self.profile(id).await
    }

    /// List members of a club. Admins and the club's head only.
    pub async fn list_club_members(
        &self,
        actor: &User,
        club_id: i64,
    ) -> Result<Vec<UserProfile>, UserServiceError> {
        if !actor.can_manage_members_of(club_id) {
            return Err(UserServiceError::Forbidden(
                "Not authorized to view members of this club".to_string(),
            ));
        }
        if self.club_repo.get_by_id(club_id).await.context("Failed to get club")?.is_none() {
            return Err(UserServiceError::NotFound("Club not found".to_string()));
        }

        Ok(self
            .user_repo
            .list_by_club(club_id)
            .await
            .context("Failed to list club members")?)
    }

    /// Remove a member from their club. Clears the club and the
    /// club_member additional role.
    pub async fn remove_club_member(
        &self,
        actor: &User,
        member_id: i64,
    ) -> Result<UserProfile, UserServiceError> {
        let mut member = self.get_user(member_id).await?;

        // Only admins learn anything about users outside their own club
        let manages = actor.is_admin()
            || member.club_id.is_some_and(|club| actor.can_manage_members_of(club));
        if !manages {
            return Err(UserServiceError::Forbidden(
                "Not authorized to manage members of this club".to_string(),
            ));
        }
        let club_id = member.club_id.ok_or_else(|| {
            UserServiceError::ValidationError("User is not a member of any club".to_string())
        })?;
        if member.id == actor.id {
            return Err(UserServiceError::ValidationError(
                "You cannot remove yourself from the club".to_string(),
            ));
        }

        member.club_id = None;
        member.revoke_additional_role(AdditionalRole::ClubMember);
        self.user_repo.update(&member).await.context("Failed to update user")?;

        tracing::info!(member_id, club_id, removed_by = actor.id, "Club member removed");
        self.profile(member_id).await
    }

    /// Create the configured admin account if its email is not taken yet.
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, config: &AdminBootstrapConfig) -> Result<bool, UserServiceError> {
        let email = config.email.trim().to_lowercase();
        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check admin email")?
            .is_some()
        {
            return Ok(false);
        }

        let password_hash = hash_password(&config.password).context("Failed to hash password")?;
        let mut admin = User::new(config.name.clone(), email, password_hash, UserRole::Admin);
        admin.can_post = true;
        let created = self.user_repo.create(&admin).await.context("Failed to create admin")?;

        tracing::info!(user_id = created.id, "Bootstrap admin account created");
        Ok(true)
    }

    async fn get_user(&self, id: i64) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| UserServiceError::NotFound("User not found".to_string()))
    }

    async fn session_for(&self, user_id: i64) -> Result<AuthSession, UserServiceError> {
        let token = self.tokens.issue(user_id).context("Failed to issue token")?;
        let user = self.profile(user_id).await?;
        Ok(AuthSession { token, user })
    }

    async fn check_references(
        &self,
        department_id: Option<i64>,
        club_id: Option<i64>,
    ) -> Result<(), UserServiceError> {
        let mut errors = ValidationErrors::new();
        if let Some(id) = department_id {
            let found = self.department_repo.get_by_id(id).await.context("Failed to get department")?;
            errors.check(found.is_some(), "department", "Department not found");
        }
        if let Some(id) = club_id {
            let found = self.club_repo.get_by_id(id).await.context("Failed to get club")?;
            errors.check(found.is_some(), "club", "Club not found");
        }
        errors.into_result().map_err(UserServiceError::InvalidInput)
    }

    fn validate_register_input(
        &self,
        input: &RegisterInput,
        email: &str,
    ) -> Result<UserRole, UserServiceError> {
        let mut errors = ValidationErrors::new();
        errors.check(!input.name.trim().is_empty(), "name", "Name is required");
        errors.check(is_valid_email(email), "email", "Please provide a valid email");
        errors.check(
            input.password.chars().count() >= MIN_PASSWORD_LENGTH,
            "password",
            "Password must be at least 6 characters",
        );

        let role = UserRole::from_str(&input.role)
            .ok()
            .filter(UserRole::is_self_assignable);
        errors.check(role.is_some(), "role", "Invalid role");

        errors.into_result().map_err(UserServiceError::InvalidInput)?;
        role.ok_or_else(|| UserServiceError::ValidationError("Invalid role".to_string()))
    }
}
