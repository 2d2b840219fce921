//! Storage layer: trait abstractions plus the file-backed implementation.

use thiserror::Error;

pub mod csv;
pub mod traits;

pub use csv::CsvConnection;
pub use traits::{AttendanceStorage, ChildStorage, GuardianStorage, LinkStorage};

/// Typed marker for a uniqueness-constraint violation, carried inside
/// `anyhow::Error` so services can downcast and map it to the matching
/// domain outcome (duplicate guardian, already checked in) instead of a
/// generic failure.
#[derive(Debug, Error)]
#[error("uniqueness violation on {constraint}: {detail}")]
pub struct UniquenessViolation {
    pub constraint: &'static str,
    pub detail: String,
}

/// Whether an error chain contains a uniqueness violation.
pub fn is_uniqueness_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<UniquenessViolation>().is_some()
}
