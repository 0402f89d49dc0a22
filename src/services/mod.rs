//! Services layer - Business logic
//!
//! This module contains all business logic services for the notice board.
//! Services are responsible for:
//! - Enforcing the role and permission rules
//! - Coordinating between repositories and attachment storage
//! - Handling validation and error cases

pub mod club;
pub mod club_application;
pub mod department;
pub mod notice;
pub mod password;
pub mod token;
pub mod upload;
pub mod user;
pub mod validation;

pub use club::{ClubService, ClubServiceError};
pub use club_application::{ClubApplicationService, ClubApplicationServiceError};
pub use department::{DepartmentService, DepartmentServiceError};
pub use notice::{NoticeQuery, NoticeService, NoticeServiceError};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService};
pub use upload::{UploadError, UploadStore, UploadedFile};
pub use user::{AuthSession, LoginInput, RegisterInput, UserService, UserServiceError};
pub use validation::{FieldError, ValidationErrors};
