//! Department model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Academic department. Academic notices may be scoped to one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    /// Unique identifier
    pub id: i64,
    /// Full name (unique)
    pub name: String,
    /// Short code such as "CSE" (unique, stored upper case)
    pub code: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Department {
    /// Create a new Department. The code is normalized to upper case.
    pub fn new(name: String, code: String, description: Option<String>) -> Self {
        Self {
            id: 0, // Will be set by the database
            name,
            code: code.to_uppercase(),
            description,
            created_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> DepartmentSummary {
        DepartmentSummary {
            id: self.id,
            name: self.name.clone(),
            code: self.code.clone(),
        }
    }
}

/// Department as embedded in users and notices
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DepartmentSummary {
    pub id: i64,
    pub name: String,
    pub code: String,
}

/// Input for creating a department
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateDepartmentInput {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}
