//! Club model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Student club. Club notices and membership applications point at one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    /// Unique identifier
    pub id: i64,
    /// Club name (unique)
    pub name: String,
    pub category: ClubCategory,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Club {
    pub fn new(name: String, category: ClubCategory, description: Option<String>) -> Self {
        Self {
            id: 0, // Will be set by the database
            name,
            category,
            description,
            created_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> ClubSummary {
        ClubSummary {
            id: self.id,
            name: self.name.clone(),
            category: self.category,
        }
    }
}

/// Club as embedded in users and notices
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClubSummary {
    pub id: i64,
    pub name: String,
    pub category: ClubCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClubCategory {
    Technical,
    Cultural,
    Sports,
    Social,
    Other,
}

impl Default for ClubCategory {
    fn default() -> Self {
        Self::Other
    }
}

impl ClubCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClubCategory::Technical => "technical",
            ClubCategory::Cultural => "cultural",
            ClubCategory::Sports => "sports",
            ClubCategory::Social => "social",
            ClubCategory::Other => "other",
        }
    }
}

impl fmt::Display for ClubCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClubCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "technical" => Ok(ClubCategory::Technical),
            "cultural" => Ok(ClubCategory::Cultural),
            "sports" => Ok(ClubCategory::Sports),
            "social" => Ok(ClubCategory::Social),
            "other" => Ok(ClubCategory::Other),
            _ => Err(anyhow::anyhow!("Invalid club category: {}", s)),
        }
    }
}

/// Input for creating a club. The category is parsed by the service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateClubInput {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
}
