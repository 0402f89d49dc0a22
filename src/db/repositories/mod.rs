//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for a specific entity.

pub mod club;
pub mod club_application;
pub mod department;
pub mod notice;
pub mod user;

pub use club::{ClubRepository, SqlxClubRepository};
pub use club_application::{ClubApplicationRepository, SqlxClubApplicationRepository};
pub use department::{DepartmentRepository, SqlxDepartmentRepository};
pub use notice::{NoticeRepository, SqlxNoticeRepository};
pub use user::{SqlxUserRepository, UserRepository};
