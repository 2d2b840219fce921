//! Command and result types for guardian directory operations.

use crate::domain::models::guardian::{ApprovalChannel, ChildGuardianLink, Guardian};

#[derive(Debug, Clone)]
pub struct CreateGuardianCommand {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub approved_by: Option<String>,
    pub approval_channel: Option<ApprovalChannel>,
}

#[derive(Debug, Clone)]
pub struct CreateGuardianResult {
    pub guardian: Guardian,
}

#[derive(Debug, Clone, Default)]
pub struct GuardianSearchQuery {
    pub term: String,
    /// Guardians already linked/selected in the current flow; excluded
    /// from results so the same person cannot be picked twice.
    pub exclude_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GuardianSearchResult {
    pub guardians: Vec<Guardian>,
}

#[derive(Debug, Clone)]
pub struct LinkGuardianCommand {
    pub child_id: String,
    pub guardian_id: String,
    pub relationship: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LinkGuardianResult {
    pub link: ChildGuardianLink,
    /// True when an existing (deactivated) row was reactivated rather
    /// than a new one inserted.
    pub reactivated: bool,
}

#[derive(Debug, Clone)]
pub struct UnlinkGuardianCommand {
    pub child_id: String,
    pub guardian_id: String,
}

#[derive(Debug, Clone)]
pub struct UnlinkGuardianResult {
    pub link: ChildGuardianLink,
}
