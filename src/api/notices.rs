//! Notice API endpoints
//!
//! - GET /api/notices - List visible notices (protected)
//! - GET /api/notices/{id} - Get a notice (protected)
//! - POST /api/notices - Post a notice, JSON or multipart with `pdfFile` (poster)
//! - PUT /api/notices/{id} - Partial update (poster)
//! - PATCH /api/notices/{id}/pin - Toggle pin (admin)
//! - DELETE /api/notices/{id} - Delete (protected)

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    response::IntoResponse,
    routing::{get, patch, post, put},
    Router,
};
use serde::Deserialize;

use crate::api::common::{
    parse_id, present, resolve_id, resolve_patch, ApiJson, ApiPath, ApiQuery, IdParam,
};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{created, ok, Message, NoticeBody, NoticeChange, NoticeList};
use crate::models::{CreateNoticeInput, UpdateNoticeInput};
use crate::services::{NoticeQuery, UploadedFile};

/// Multipart field carrying the attachment
const FILE_FIELD: &str = "pdfFile";

/// Query parameters for listing
#[derive(Debug, Default, Deserialize)]
pub struct ListNoticesQuery {
    #[serde(rename = "type")]
    pub notice_type: Option<String>,
    pub department: Option<String>,
    pub club: Option<String>,
}

/// JSON body for posting a notice
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateNoticeRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub notice_type: Option<String>,
    pub format: Option<String>,
    pub department: Option<IdParam>,
    pub club: Option<IdParam>,
}

impl CreateNoticeRequest {
    fn into_input(self) -> Result<CreateNoticeInput, ApiError> {
        Ok(CreateNoticeInput {
            department_id: resolve_id("department", self.department.as_ref())?,
            club_id: resolve_id("club", self.club.as_ref())?,
            title: self.title,
            content: self.content,
            notice_type: self.notice_type,
            format: self.format,
        })
    }
}

/// JSON body for a partial update
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateNoticeRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub notice_type: Option<String>,
    #[serde(deserialize_with = "present")]
    pub department: Option<Option<IdParam>>,
    #[serde(deserialize_with = "present")]
    pub club: Option<Option<IdParam>>,
}

/// Routes for any authenticated user
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/notices", get(list_notices))
        .route("/notices/{id}", get(get_notice).delete(delete_notice))
}

/// Routes that require the posting privilege
pub fn poster_routes() -> Router<AppState> {
    Router::new()
        .route("/notices", post(create_notice))
        .route("/notices/{id}", put(update_notice))
}

/// Admin-only routes
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/notices/{id}/pin", patch(toggle_pin))
}

/// GET /api/notices
async fn list_notices(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiQuery(query): ApiQuery<ListNoticesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let query = NoticeQuery {
        notice_type: query.notice_type,
        department_id: parse_id("department", query.department.as_deref())?,
        club_id: parse_id("club", query.club.as_deref())?,
    };

    let notices = state.notice_service.list(&user, query).await?;
    Ok(ok(NoticeList {
        count: notices.len(),
        notices,
    }))
}

/// GET /api/notices/{id}
async fn get_notice(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let notice = state.notice_service.get(&user, id).await?;
    Ok(ok(NoticeBody { notice }))
}

/// POST /api/notices
///
/// Accepts `multipart/form-data` (text fields plus an optional `pdfFile`)
/// or a JSON body without attachment.
async fn create_notice(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let (input, attachment) = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::validation_error(e.body_text()))?;
        read_notice_form(multipart).await?
    } else {
        let ApiJson(body) = ApiJson::<CreateNoticeRequest>::from_request(request, &state).await?;
        (body.into_input()?, None)
    };

    let notice = state.notice_service.create(&user, input, attachment).await?;
    Ok(created(NoticeBody { notice }))
}

/// Collect notice fields and the optional attachment from a form
async fn read_notice_form(
    mut multipart: Multipart,
) -> Result<(CreateNoticeInput, Option<UploadedFile>), ApiError> {
    let mut input = CreateNoticeInput::default();
    let mut attachment = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(e.body_text()))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == FILE_FIELD {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation_error(e.body_text()))?;

            // Browsers send an empty part when no file was chosen
            let unset = data.is_empty() && file_name.as_deref().unwrap_or("").is_empty();
            if !unset {
                attachment = Some(UploadedFile {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::validation_error(e.body_text()))?;
        match name.as_str() {
            "title" => input.title = Some(value),
            "content" => input.content = Some(value),
            "type" => input.notice_type = Some(value),
            "format" => input.format = Some(value),
            "department" => input.department_id = parse_id("department", Some(&value))?,
            "club" => input.club_id = parse_id("club", Some(&value))?,
            _ => {}
        }
    }

    Ok((input, attachment))
}

/// PUT /api/notices/{id}
async fn update_notice(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateNoticeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdateNoticeInput {
        department_id: resolve_patch("department", body.department.as_ref().map(Option::as_ref))?,
        club_id: resolve_patch("club", body.club.as_ref().map(Option::as_ref))?,
        title: body.title,
        content: body.content,
        notice_type: body.notice_type,
    };

    let notice = state.notice_service.update(&user, id, input).await?;
    Ok(ok(NoticeChange {
        message: "Notice updated successfully",
        notice,
    }))
}

/// PATCH /api/notices/{id}/pin
async fn toggle_pin(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let notice = state.notice_service.toggle_pin(&user, id).await?;
    let message = if notice.notice.is_pinned {
        "Notice pinned successfully"
    } else {
        "Notice unpinned successfully"
    };
    Ok(ok(NoticeChange { message, notice }))
}

/// DELETE /api/notices/{id}
async fn delete_notice(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.notice_service.delete(&user, id).await?;
    Ok(ok(Message {
        message: "Notice deleted successfully",
    }))
}
