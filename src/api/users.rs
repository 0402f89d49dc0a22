//! User administration API endpoints
//!
//! Admin only:
//! - GET /api/users - List users
//! - PUT /api/users/{id}/privileges - Grant or revoke posting
//! - PUT /api/users/{id}/role - Change the primary role
//! - PUT /api/users/{id}/additional-roles - Replace additional roles
//!
//! Admin or the club's head:
//! - GET /api/users/club-members/{id} - Members of a club
//! - DELETE /api/users/club-members/{id} - Remove a member from their club

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use serde::Deserialize;

use crate::api::common::{resolve_id, ApiJson, ApiPath, IdParam};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{ok, MemberList, UserBody, UserList};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrivilegesRequest {
    pub can_post: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RoleRequest {
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdditionalRolesRequest {
    pub additional_roles: Vec<String>,
    pub club: Option<IdParam>,
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}/privileges", put(update_privileges))
        .route("/users/{id}/role", put(update_role))
        .route("/users/{id}/additional-roles", put(update_additional_roles))
}

/// Club membership management; permission is checked per club
pub fn protected_routes() -> Router<AppState> {
    Router::new().route(
        "/users/club-members/{id}",
        get(list_club_members).delete(remove_club_member),
    )
}

/// GET /api/users
async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.user_service.list().await?;
    Ok(ok(UserList {
        count: users.len(),
        users,
    }))
}

/// PUT /api/users/{id}/privileges
async fn update_privileges(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<PrivilegesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let can_post = body
        .can_post
        .ok_or_else(|| ApiError::validation_error("Please provide canPost"))?;
    let user = state.user_service.set_can_post(id, can_post).await?;
    Ok(ok(UserBody { user }))
}

/// PUT /api/users/{id}/role
async fn update_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<RoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.set_role(id, &body.role).await?;
    Ok(ok(UserBody { user }))
}

/// PUT /api/users/{id}/additional-roles
async fn update_additional_roles(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<AdditionalRolesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let club_id = resolve_id("club", body.club.as_ref())?;
    let user = state
        .user_service
        .set_additional_roles(id, &body.additional_roles, club_id)
        .await?;
    Ok(ok(UserBody { user }))
}

/// GET /api/users/club-members/{club_id}
async fn list_club_members(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiPath(club_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let members = state.user_service.list_club_members(&user, club_id).await?;
    Ok(ok(MemberList {
        count: members.len(),
        members,
    }))
}

/// DELETE /api/users/club-members/{member_id}
async fn remove_club_member(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiPath(member_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.remove_club_member(&user, member_id).await?;
    Ok(ok(UserBody { user }))
}
