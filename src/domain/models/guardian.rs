use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a guardian's authorization was approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalChannel {
    Call,
    Sms,
    InPerson,
}

impl ApprovalChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalChannel::Call => "call",
            ApprovalChannel::Sms => "sms",
            ApprovalChannel::InPerson => "in_person",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "call" => Some(ApprovalChannel::Call),
            "sms" => Some(ApprovalChannel::Sms),
            "in_person" => Some(ApprovalChannel::InPerson),
            _ => None,
        }
    }
}

/// Domain model representing an adult who may be authorized to drop off
/// or collect children.
///
/// A guardian on its own authorizes nothing; authorization for a specific
/// child always flows through an active [`ChildGuardianLink`].
/// Uniqueness invariant: no two active guardians may share the same
/// (first name, last name, phone) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guardian {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Required; part of the de-duplication key together with the name.
    pub phone: String,
    pub approved_by: Option<String>,
    pub approval_channel: Option<ApprovalChannel>,
    pub approved_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guardian {
    /// Generate a unique ID for a guardian
    pub fn generate_id() -> String {
        format!("guardian::{}", Uuid::new_v4())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Join record authorizing a guardian for a specific child.
///
/// The link is the sole authority for "may this guardian check this child
/// in or out". The relationship label lives here, not on the guardian,
/// because the same adult can be "mother" to one child and "aunt" to
/// another. Links are soft-deactivated, never deleted, so the audit
/// history of who was ever authorized survives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildGuardianLink {
    pub id: String,
    pub child_id: String,
    pub guardian_id: String,
    pub relationship: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChildGuardianLink {
    /// Generate a unique ID for a link
    pub fn generate_id() -> String {
        format!("link::{}", Uuid::new_v4())
    }
}
