//! User model
//!
//! Defines the User entity, its primary and additional roles, and the
//! permission predicates every handler consults before touching notices,
//! clubs, or applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ClubSummary, DepartmentSummary, Notice, NoticeType};

/// User entity representing a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Primary role
    pub role: UserRole,
    /// Roles held on top of the primary one
    #[serde(default)]
    pub additional_roles: Vec<AdditionalRole>,
    /// Department the user belongs to
    pub department_id: Option<i64>,
    /// Club the user belongs to (or heads)
    pub club_id: Option<i64>,
    /// Posting privilege granted by an admin
    pub can_post: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User. The password must already be hashed.
    ///
    /// Faculty accounts start with posting enabled, everyone else without.
    pub fn new(name: String, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            name,
            email,
            password_hash,
            role,
            additional_roles: Vec::new(),
            department_id: None,
            club_id: None,
            can_post: role == UserRole::Faculty,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Check if the user is a student (subject to department scoping)
    pub fn is_student(&self) -> bool {
        self.role == UserRole::Student
    }

    /// Check if the user holds the given additional role
    pub fn has_additional_role(&self, role: AdditionalRole) -> bool {
        self.additional_roles.contains(&role)
    }

    /// Check if the user heads a club
    pub fn is_club_head(&self) -> bool {
        self.has_additional_role(AdditionalRole::ClubHead)
    }

    /// Posting is open to admins and to anyone granted the privilege
    pub fn may_post(&self) -> bool {
        self.can_post || self.is_admin()
    }

    /// Admins may delete any notice, authors their own
    pub fn can_delete_notice(&self, notice: &Notice) -> bool {
        self.is_admin() || notice.posted_by == self.id
    }

    /// Editing additionally requires the posting privilege
    pub fn can_edit_notice(&self, notice: &Notice) -> bool {
        self.may_post() && self.can_delete_notice(notice)
    }

    /// Only admins pin or unpin
    pub fn can_pin_notice(&self) -> bool {
        self.is_admin()
    }

    /// Students only see academic notices that are general or from their
    /// own department. Club notices are visible to everyone.
    pub fn can_view_notice(&self, notice: &Notice) -> bool {
        if !self.is_student() || notice.notice_type != NoticeType::Academic {
            return true;
        }
        match notice.department_id {
            None => true,
            Some(department_id) => self.department_id == Some(department_id),
        }
    }

    /// Check if the user heads the given club
    pub fn heads_club(&self, club_id: i64) -> bool {
        self.is_club_head() && self.club_id == Some(club_id)
    }

    /// Admins and the head of the club may approve or reject applications
    pub fn can_review_applications_for(&self, club_id: i64) -> bool {
        self.is_admin() || self.heads_club(club_id)
    }

    /// Same rule as reviewing: admins and the club's head manage membership
    pub fn can_manage_members_of(&self, club_id: i64) -> bool {
        self.can_review_applications_for(club_id)
    }

    /// Grant an additional role, ignoring duplicates
    pub fn grant_additional_role(&mut self, role: AdditionalRole) {
        if !self.has_additional_role(role) {
            self.additional_roles.push(role);
        }
    }

    /// Remove an additional role if held
    pub fn revoke_additional_role(&mut self, role: AdditionalRole) {
        self.additional_roles.retain(|r| *r != role);
    }
}

/// Primary user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Faculty,
    ClubMember,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Student
    }
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Faculty => "faculty",
            UserRole::ClubMember => "club_member",
            UserRole::Admin => "admin",
        }
    }

    /// Roles a visitor may pick for themself at registration
    pub fn is_self_assignable(&self) -> bool {
        !matches!(self, UserRole::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(UserRole::Student),
            "faculty" => Ok(UserRole::Faculty),
            "club_member" => Ok(UserRole::ClubMember),
            "admin" => Ok(UserRole::Admin),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Role held in addition to the primary role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdditionalRole {
    /// Approved member of the user's club
    ClubMember,
    /// Head of the user's club; reviews applications and manages members
    ClubHead,
}

impl AdditionalRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdditionalRole::ClubMember => "club_member",
            AdditionalRole::ClubHead => "club_head",
        }
    }
}

impl fmt::Display for AdditionalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdditionalRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "club_member" => Ok(AdditionalRole::ClubMember),
            "club_head" => Ok(AdditionalRole::ClubHead),
            _ => Err(anyhow::anyhow!("Invalid additional role: {}", s)),
        }
    }
}

/// User with department and club populated, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub department: Option<DepartmentSummary>,
    pub club: Option<ClubSummary>,
}

impl UserProfile {
    pub fn id(&self) -> i64 {
        self.user.id
    }
}

/// Author embedded in a notice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub role: UserRole,
}

/// Applicant embedded in a club application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub department: Option<DepartmentSummary>,
}

/// Reviewer embedded in a club application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reviewer {
    pub id: i64,
    pub name: String,
}

#[cfg(test)]
pub(crate) fn test_user(id: i64, role: UserRole) -> User {
    let mut user = User::new(
        format!("user{}", id),
        format!("user{}@vit.edu", id),
        "hash".to_string(),
        role,
    );
    user.id = id;
    user
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::models::{NoticeFormat, NoticeType};
    use proptest::prelude::*;

    fn role_strategy() -> impl Strategy<Value = UserRole> {
        prop_oneof![
            Just(UserRole::Student),
            Just(UserRole::Faculty),
            Just(UserRole::ClubMember),
            Just(UserRole::Admin),
        ]
    }

    fn notice_type_strategy() -> impl Strategy<Value = NoticeType> {
        prop_oneof![Just(NoticeType::Academic), Just(NoticeType::Club)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn non_admin_edits_only_own_notices(
            role in role_strategy(),
            can_post in any::<bool>(),
            user_id in 1i64..50,
            author_id in 1i64..50,
        ) {
            prop_assume!(role != UserRole::Admin);
            let mut user = test_user(user_id, role);
            user.can_post = can_post;
            let notice = Notice::new("t".into(), "c".into(), NoticeType::Club, NoticeFormat::Text, author_id);

            prop_assert_eq!(user.can_edit_notice(&notice), can_post && user_id == author_id);
            prop_assert_eq!(user.can_delete_notice(&notice), user_id == author_id);
        }

        #[test]
        fn only_students_are_department_scoped(
            role in role_strategy(),
            notice_type in notice_type_strategy(),
            user_department in proptest::option::of(1i64..5),
            notice_department in proptest::option::of(1i64..5),
        ) {
            let mut user = test_user(1, role);
            user.department_id = user_department;
            let mut notice = Notice::new("t".into(), "c".into(), notice_type, NoticeFormat::Text, 2);
            notice.department_id = notice_department;

            let expected = role != UserRole::Student
                || notice_type == NoticeType::Club
                || notice_department.is_none()
                || notice_department == user_department;
            prop_assert_eq!(user.can_view_notice(&notice), expected);
        }

        #[test]
        fn review_permission_matches_headship(
            role in role_strategy(),
            is_head in any::<bool>(),
            user_club in proptest::option::of(1i64..5),
            club in 1i64..5,
        ) {
            let mut user = test_user(1, role);
            user.club_id = user_club;
            if is_head {
                user.grant_additional_role(AdditionalRole::ClubHead);
            }
            let expected = role == UserRole::Admin || (is_head && user_club == Some(club));
            prop_assert_eq!(user.can_review_applications_for(club), expected);
        }
    }
}
