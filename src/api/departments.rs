//! Department API endpoints
//!
//! - GET /api/departments - List departments (public)
//! - POST /api/departments - Create a department (admin)

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use crate::api::common::ApiJson;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{created, ok, DepartmentBody, DepartmentList};
use crate::models::CreateDepartmentInput;

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/departments", get(list_departments))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/departments", post(create_department))
}

/// GET /api/departments
async fn list_departments(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let departments = state.department_service.list().await?;
    Ok(ok(DepartmentList {
        count: departments.len(),
        departments,
    }))
}

/// POST /api/departments
async fn create_department(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateDepartmentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let department = state.department_service.create(body).await?;
    Ok(created(DepartmentBody { department }))
}
