//! Error taxonomy for the check-in domain.
//!
//! Every error is local to the operation that raised it: a failed
//! operation leaves the session at its last stable step, and the caller
//! can retry or cancel. Duplicate and conflict conditions get distinct
//! variants so the desk can show a specific, actionable message instead
//! of a raw store error.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// No valid caller identity; the shell should hand off to login.
    #[error("no authenticated caller")]
    NotAuthenticated,

    /// A required field is missing or malformed; the operation was not
    /// attempted against storage.
    #[error("{0}")]
    Validation(String),

    /// An active guardian with the same name and phone already exists.
    #[error("a guardian named {0} with that phone number already exists")]
    DuplicateGuardian(String),

    /// The child already has an attendance record (open or closed) for
    /// this service date.
    #[error("child {child_id} is already checked in for {service_date}")]
    AlreadyCheckedIn {
        child_id: String,
        service_date: NaiveDate,
    },

    /// The selected guardian is not an active, linked guardian for the
    /// child involved.
    #[error("guardian {guardian_id} is not authorized for child {child_id}")]
    GuardianNotAuthorized {
        child_id: String,
        guardian_id: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    /// Anything the backing store reports that is not a recognized
    /// uniqueness violation: connectivity, corrupt rows, IO failures.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl DomainError {
    /// Whether the caller can recover by adjusting input and retrying
    /// (as opposed to a store-level failure).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DomainError::Storage(_))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
