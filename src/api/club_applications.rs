//! Club application API endpoints
//!
//! - GET /api/club-applications - All applications (admin)
//! - GET /api/club-applications/club-head - Applications to the head's club
//! - GET /api/club-applications/my-applications - The caller's applications
//! - POST /api/club-applications - Apply to a club
//! - PATCH /api/club-applications/{id} - Approve or reject

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;

use crate::api::common::{resolve_id, ApiJson, ApiPath, IdParam};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{created, ok, ApplicationBody, ApplicationList, ClubHeadApplications};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApplyRequest {
    pub club: Option<IdParam>,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReviewRequest {
    pub status: String,
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/club-applications", get(list_all))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/club-applications", post(apply))
        .route("/club-applications/club-head", get(club_head_applications))
        .route("/club-applications/my-applications", get(my_applications))
        .route("/club-applications/{id}", patch(review))
}

/// GET /api/club-applications
async fn list_all(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let applications = state.application_service.list_all().await?;
    Ok(ok(ApplicationList {
        count: applications.len(),
        applications,
    }))
}

/// GET /api/club-applications/club-head
async fn club_head_applications(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let (applications, club) = state.application_service.for_club_head(&user).await?;
    Ok(ok(ClubHeadApplications {
        count: applications.len(),
        applications,
        club,
    }))
}

/// GET /api/club-applications/my-applications
async fn my_applications(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let applications = state.application_service.mine(&user).await?;
    Ok(ok(ApplicationList {
        count: applications.len(),
        applications,
    }))
}

/// POST /api/club-applications
async fn apply(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(body): ApiJson<ApplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let club_id = resolve_id("club", body.club.as_ref())?;
    let application = state
        .application_service
        .apply(&user, club_id, body.reason.as_deref())
        .await?;
    Ok(created(ApplicationBody { application }))
}

/// PATCH /api/club-applications/{id}
async fn review(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let application = state.application_service.review(&user, id, &body.status).await?;
    Ok(ok(ApplicationBody { application }))
}
