//! Shared API response types
//!
//! Every successful body is an object carrying `success: true` next to the
//! payload fields, e.g. `{"success": true, "count": 2, "clubs": [...]}`.

use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::models::{Club, ClubApplicationView, Department, NoticeView, UserProfile};

/// Success envelope. The payload must serialize as a map.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

/// 200 with the payload
pub fn ok<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        data,
    })
}

/// 201 with the payload
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Success<T>>) {
    (StatusCode::CREATED, ok(data))
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UserBody {
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub count: usize,
    pub users: Vec<UserProfile>,
}

#[derive(Debug, Serialize)]
pub struct MemberList {
    pub count: usize,
    pub members: Vec<UserProfile>,
}

#[derive(Debug, Serialize)]
pub struct NoticeBody {
    pub notice: NoticeView,
}

#[derive(Debug, Serialize)]
pub struct NoticeList {
    pub count: usize,
    pub notices: Vec<NoticeView>,
}

/// Mutation result carrying a human message
#[derive(Debug, Serialize)]
pub struct NoticeChange {
    pub message: &'static str,
    pub notice: NoticeView,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ClubBody {
    pub club: Club,
}

#[derive(Debug, Serialize)]
pub struct ClubList {
    pub count: usize,
    pub clubs: Vec<Club>,
}

#[derive(Debug, Serialize)]
pub struct DepartmentBody {
    pub department: Department,
}

#[derive(Debug, Serialize)]
pub struct DepartmentList {
    pub count: usize,
    pub departments: Vec<Department>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationBody {
    pub application: ClubApplicationView,
}

#[derive(Debug, Serialize)]
pub struct ApplicationList {
    pub count: usize,
    pub applications: Vec<ClubApplicationView>,
}

/// Applications to a club head's club
#[derive(Debug, Serialize)]
pub struct ClubHeadApplications {
    pub count: usize,
    pub applications: Vec<ClubApplicationView>,
    pub club: Club,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_flattens_payload() {
        let Json(body) = ok(Message { message: "Notice deleted successfully" });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Notice deleted successfully");
    }

    #[test]
    fn test_created_status() {
        let (status, _) = created(ClubList {
            count: 0,
            clubs: vec![],
        });
        assert_eq!(status, StatusCode::CREATED);
    }
}
