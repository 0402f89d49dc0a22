//! Club API endpoints
//!
//! - GET /api/clubs - List clubs (public)
//! - POST /api/clubs - Create a club (admin)

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use crate::api::common::ApiJson;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{created, ok, ClubBody, ClubList};
use crate::models::CreateClubInput;

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/clubs", get(list_clubs))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/clubs", post(create_club))
}

/// GET /api/clubs
async fn list_clubs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let clubs = state.club_service.list().await?;
    Ok(ok(ClubList {
        count: clubs.len(),
        clubs,
    }))
}

/// POST /api/clubs
async fn create_club(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateClubInput>,
) -> Result<impl IntoResponse, ApiError> {
    let club = state.club_service.create(body).await?;
    Ok(created(ClubBody { club }))
}
