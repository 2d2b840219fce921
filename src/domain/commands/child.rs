//! Command and result types for child directory operations.

use crate::domain::models::child::Child;

#[derive(Debug, Clone)]
pub struct CreateChildCommand {
    pub first_name: String,
    pub last_name: String,
    /// ISO 8601 date (YYYY-MM-DD); required at creation.
    pub birthdate: String,
    pub allergies: Option<String>,
    pub medical_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateChildResult {
    pub child: Child,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateChildCommand {
    pub child_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthdate: Option<String>,
    pub allergies: Option<String>,
    pub medical_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateChildResult {
    pub child: Child,
}

#[derive(Debug, Clone)]
pub struct GetChildCommand {
    pub child_id: String,
}

#[derive(Debug, Clone)]
pub struct GetChildResult {
    pub child: Option<Child>,
}

#[derive(Debug, Clone)]
pub struct DeactivateChildCommand {
    pub child_id: String,
}

#[derive(Debug, Clone)]
pub struct DeactivateChildResult {
    pub child: Child,
}

#[derive(Debug, Clone)]
pub struct ChildSearchQuery {
    pub term: String,
}

#[derive(Debug, Clone)]
pub struct ChildSearchResult {
    pub children: Vec<Child>,
}
