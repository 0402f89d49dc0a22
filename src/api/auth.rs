//! Authentication API endpoints
//!
//! - POST /api/auth/register - Create an account and get a token
//! - POST /api/auth/login - Exchange credentials for a token
//! - GET /api/auth/me - Current user, populated

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{resolve_id, ApiJson, IdParam};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{created, ok, UserBody};
use crate::models::UserProfile;
use crate::services::{AuthSession, LoginInput, RegisterInput};

/// Request body for registration. Missing fields fall through to
/// validation so the client gets field errors rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub department: Option<IdParam>,
    pub club: Option<IdParam>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token,
            user: session.user,
        }
    }
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = RegisterInput {
        department_id: resolve_id("department", body.department.as_ref())?,
        club_id: resolve_id("club", body.club.as_ref())?,
        name: body.name,
        email: body.email,
        password: body.password,
        role: body.role,
    };

    let session = state.user_service.register(input).await?;
    Ok(created(AuthResponse::from(session)))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .user_service
        .login(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(ok(AuthResponse::from(session)))
}

/// GET /api/auth/me
async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.profile(user.id).await?;
    Ok(ok(UserBody { user }))
}
