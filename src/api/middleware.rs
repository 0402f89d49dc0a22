//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error type and the mapping from service errors
//! - Authentication (bearer token validation)
//! - Authorization gates for admins and posters

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::config::{Config, UploadConfig};
use crate::db::repositories::{
    SqlxClubApplicationRepository, SqlxClubRepository, SqlxDepartmentRepository,
    SqlxNoticeRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::{
    ClubApplicationService, ClubApplicationServiceError, ClubService, ClubServiceError,
    DepartmentService, DepartmentServiceError, FieldError, NoticeService, NoticeServiceError,
    UploadStore, UserService, UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub notice_service: Arc<NoticeService>,
    pub club_service: Arc<ClubService>,
    pub department_service: Arc<DepartmentService>,
    pub application_service: Arc<ClubApplicationService>,
    pub upload_config: Arc<UploadConfig>,
}

impl AppState {
    /// Wire repositories and services over a migrated pool
    pub fn build(pool: DynDatabasePool, config: &Config) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let department_repo = SqlxDepartmentRepository::boxed(pool.clone());
        let club_repo = SqlxClubRepository::boxed(pool.clone());
        let notice_repo = SqlxNoticeRepository::boxed(pool.clone());
        let application_repo = SqlxClubApplicationRepository::boxed(pool);

        let user_service = UserService::new(
            user_repo.clone(),
            department_repo.clone(),
            club_repo.clone(),
            &config.auth,
        );
        let notice_service = NoticeService::new(
            notice_repo,
            department_repo.clone(),
            club_repo.clone(),
            UploadStore::new(config.upload.clone()),
        );
        let application_service =
            ClubApplicationService::new(application_repo, club_repo.clone(), user_repo);

        Self {
            user_service: Arc::new(user_service),
            notice_service: Arc::new(notice_service),
            club_service: Arc::new(ClubService::new(club_repo)),
            department_service: Arc::new(DepartmentService::new(department_repo)),
            application_service: Arc::new(application_service),
            upload_config: Arc::new(config.upload.clone()),
        }
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized(NOT_AUTHORIZED))
    }
}

const NOT_AUTHORIZED: &str = "Not authorized to access this route";

/// Error response for API errors
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.into(),
            message: message.into(),
            errors: None,
        }
    }

    /// Validation failure carrying per-field messages
    pub fn with_fields(message: impl Into<String>, errors: &[FieldError]) -> Self {
        Self {
            errors: Some(errors.to_vec()),
            ..Self::validation_error(message)
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    /// Log the cause and answer with a generic 500
    pub fn internal_error(cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "Request failed");
        Self::new("INTERNAL_ERROR", "Server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

// ============================================================================
// Service error mapping
// ============================================================================

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::AuthenticationError(m) => ApiError::unauthorized(m),
            UserServiceError::Forbidden(m) => ApiError::forbidden(m),
            UserServiceError::InvalidInput(errors) => {
                ApiError::with_fields(errors.to_string(), errors.errors())
            }
            UserServiceError::ValidationError(m) | UserServiceError::UserExists(m) => {
                ApiError::validation_error(m)
            }
            UserServiceError::NotFound(m) => ApiError::not_found(m),
            UserServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<NoticeServiceError> for ApiError {
    fn from(err: NoticeServiceError) -> Self {
        match err {
            NoticeServiceError::InvalidInput(errors) => {
                ApiError::with_fields(errors.to_string(), errors.errors())
            }
            NoticeServiceError::ValidationError(m) => ApiError::validation_error(m),
            NoticeServiceError::NotFound(m) => ApiError::not_found(m),
            NoticeServiceError::Forbidden(m) => ApiError::forbidden(m),
            NoticeServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<ClubServiceError> for ApiError {
    fn from(err: ClubServiceError) -> Self {
        match err {
            ClubServiceError::InvalidInput(errors) => {
                ApiError::with_fields(errors.to_string(), errors.errors())
            }
            ClubServiceError::Conflict(m) => ApiError::conflict(m),
            ClubServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<DepartmentServiceError> for ApiError {
    fn from(err: DepartmentServiceError) -> Self {
        match err {
            DepartmentServiceError::InvalidInput(errors) => {
                ApiError::with_fields(errors.to_string(), errors.errors())
            }
            DepartmentServiceError::Conflict(m) => ApiError::conflict(m),
            DepartmentServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<ClubApplicationServiceError> for ApiError {
    fn from(err: ClubApplicationServiceError) -> Self {
        match err {
            ClubApplicationServiceError::ValidationError(m) => ApiError::validation_error(m),
            ClubApplicationServiceError::NotFound(m) => ApiError::not_found(m),
            ClubApplicationServiceError::Forbidden(m) => ApiError::forbidden(m),
            ClubApplicationServiceError::InternalError(e) => {
                ApiError::internal_error(format!("{:#}", e))
            }
        }
    }
}

// ============================================================================
// Authentication and authorization
// ============================================================================

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware. Loads the token's user fresh from the
/// database and attaches it to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized(NOT_AUTHORIZED))?;

    let user = state.user_service.authenticate(token).await?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

fn authenticated(request: &Request) -> Result<&User, ApiError> {
    request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|au| &au.0)
        .ok_or_else(|| ApiError::unauthorized(NOT_AUTHORIZED))
}

/// Admin authorization middleware. Must run after [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = authenticated(&request)?;
    if !user.is_admin() {
        return Err(ApiError::forbidden(format!(
            "User role {} is not authorized to access this route",
            user.role
        )));
    }
    Ok(next.run(request).await)
}

/// Posting privilege middleware. Must run after [`require_auth`].
pub async fn require_poster(request: Request, next: Next) -> Result<Response, ApiError> {
    if !authenticated(&request)?.may_post() {
        return Err(ApiError::forbidden("You do not have permission to post notices"));
    }
    Ok(next.run(request).await)
}
