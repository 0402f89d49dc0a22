//! Data models
//!
//! This module contains all data structures used throughout the notice board.
//! Models represent:
//! - Database entities (User, Department, Club, Notice, ClubApplication)
//! - Populated views returned by the API
//! - Service input types

mod club;
mod club_application;
mod department;
mod notice;
mod user;

pub use club::{Club, ClubCategory, ClubSummary, CreateClubInput};
pub use club_application::{ApplicationStatus, ClubApplication, ClubApplicationView};
pub use department::{CreateDepartmentInput, Department, DepartmentSummary};
pub use notice::{
    CreateNoticeInput, Notice, NoticeFilter, NoticeFormat, NoticeType, NoticeView, PdfFile,
    UpdateNoticeInput,
};
pub use user::{AdditionalRole, Applicant, Author, Reviewer, User, UserProfile, UserRole};

#[cfg(test)]
pub(crate) use user::test_user;
