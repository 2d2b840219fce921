use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain model representing a child known to the check-in desk.
///
/// Children are only ever soft-deleted (`is_active = false`) because
/// historical attendance records must stay referable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Needed to compute an age bucket; a missing birthdate falls back
    /// to the default bucket rather than failing.
    pub birthdate: Option<NaiveDate>,
    pub allergies: String,
    pub medical_notes: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Child {
    /// Generate a unique ID for a child
    pub fn generate_id() -> String {
        format!("child::{}", Uuid::new_v4())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
