//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer. The
//! domain services specify the queries and invariants they need here; how
//! a particular store executes them is the backend's concern.

use anyhow::Result;
use chrono::NaiveDate;

use crate::domain::models::attendance::AttendanceRecord;
use crate::domain::models::child::Child as DomainChild;
use crate::domain::models::guardian::{ChildGuardianLink, Guardian as DomainGuardian};

/// Trait defining the interface for child storage operations
pub trait ChildStorage: Send + Sync {
    /// Store a new child
    fn store_child(&self, child: &DomainChild) -> Result<()>;

    /// Retrieve a specific child by ID (zero-or-one)
    fn get_child(&self, child_id: &str) -> Result<Option<DomainChild>>;

    /// List all children ordered by name
    fn list_children(&self) -> Result<Vec<DomainChild>>;

    /// Case-insensitive substring search over first/last name,
    /// active children only, ordered by name
    fn search_children(&self, term: &str) -> Result<Vec<DomainChild>>;

    /// Update an existing child
    fn update_child(&self, child: &DomainChild) -> Result<()>;
}

/// Trait defining the interface for guardian storage operations
///
/// `store_guardian` must surface a violation of the active-guardian
/// (first name, last name, phone) uniqueness constraint as a
/// [`crate::storage::UniquenessViolation`] inside the error, distinct
/// from any other failure.
pub trait GuardianStorage: Send + Sync {
    /// Store a new guardian, enforcing the uniqueness constraint
    fn store_guardian(&self, guardian: &DomainGuardian) -> Result<()>;

    /// Retrieve a specific guardian by ID (zero-or-one)
    fn get_guardian(&self, guardian_id: &str) -> Result<Option<DomainGuardian>>;

    /// Case-insensitive substring search over full name and phone,
    /// active guardians only, ordered by name
    fn search_guardians(&self, term: &str) -> Result<Vec<DomainGuardian>>;

    /// Update an existing guardian
    fn update_guardian(&self, guardian: &DomainGuardian) -> Result<()>;
}

/// Trait defining the interface for child-guardian link storage
pub trait LinkStorage: Send + Sync {
    /// Store a new link
    fn store_link(&self, link: &ChildGuardianLink) -> Result<()>;

    /// Find the link row for a (child, guardian) pair, active or not
    fn get_link(&self, child_id: &str, guardian_id: &str) -> Result<Option<ChildGuardianLink>>;

    /// List all links (active and inactive) for a child
    fn links_for_child(&self, child_id: &str) -> Result<Vec<ChildGuardianLink>>;

    /// Update an existing link (reactivation, deactivation,
    /// relationship change)
    fn update_link(&self, link: &ChildGuardianLink) -> Result<()>;
}

/// Trait defining the interface for attendance storage
///
/// `store_record` is the authoritative guard for the one-record-per
/// (child, service date) invariant: a second insert for the same pair
/// must fail with a [`crate::storage::UniquenessViolation`], never
/// write a second row.
pub trait AttendanceStorage: Send + Sync {
    /// Store a new attendance record, enforcing the per-date uniqueness
    fn store_record(&self, record: &AttendanceRecord) -> Result<()>;

    /// Retrieve a specific record by ID for a given service date
    fn get_record(&self, service_date: NaiveDate, record_id: &str)
        -> Result<Option<AttendanceRecord>>;

    /// Find a child's record (open or closed) for a service date
    fn find_record_for_child(
        &self,
        service_date: NaiveDate,
        child_id: &str,
    ) -> Result<Option<AttendanceRecord>>;

    /// All records for a service date, in file order
    fn records_for_date(&self, service_date: NaiveDate) -> Result<Vec<AttendanceRecord>>;

    /// Update an existing record (checkout)
    fn update_record(&self, record: &AttendanceRecord) -> Result<()>;
}
