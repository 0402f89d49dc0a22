//! Club membership application model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Applicant, Club, Reviewer};

/// A student's request to join a club.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClubApplication {
    /// Unique identifier
    pub id: i64,
    pub club_id: i64,
    pub student_id: i64,
    /// Why the student wants to join
    pub reason: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(rename = "reviewedById")]
    pub reviewed_by: Option<i64>,
}

impl ClubApplication {
    pub fn new(club_id: i64, student_id: i64, reason: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            club_id,
            student_id,
            reason,
            status: ApplicationStatus::Pending,
            applied_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
        }
    }

    /// Record a review decision
    pub fn review(&mut self, status: ApplicationStatus, reviewer_id: i64) {
        self.status = status;
        self.reviewed_at = Some(Utc::now());
        self.reviewed_by = Some(reviewer_id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl Default for ApplicationStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 3] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Pending and approved applications block a new one for the same club
    pub fn blocks_reapplication(&self) -> bool {
        matches!(self, ApplicationStatus::Pending | ApplicationStatus::Approved)
    }

    /// A review may only move an application to one of these
    pub fn is_decision(&self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid application status: {}", s)),
        }
    }
}

/// Application with club, student and reviewer populated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubApplicationView {
    #[serde(flatten)]
    pub application: ClubApplication,
    pub club: Club,
    pub student: Applicant,
    pub reviewed_by: Option<Reviewer>,
}
