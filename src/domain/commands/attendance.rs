//! Command and result types for attendance operations.

use chrono::NaiveDate;

use crate::domain::models::attendance::{AttendanceRecord, Roster};

#[derive(Debug, Clone)]
pub struct CheckInCommand {
    pub child_id: String,
    pub guardian_id: String,
    pub service_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct CheckInResult {
    pub record: AttendanceRecord,
}

#[derive(Debug, Clone)]
pub struct CheckOutCommand {
    pub attendance_id: String,
    pub service_date: NaiveDate,
    pub guardian_id: String,
}

#[derive(Debug, Clone)]
pub struct CheckOutResult {
    pub record: AttendanceRecord,
    /// True when the record was already closed and this call changed
    /// nothing (double-checkout is a no-op success, not an error).
    pub already_checked_out: bool,
}

#[derive(Debug, Clone)]
pub struct RosterQuery {
    pub service_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct RosterResult {
    pub roster: Roster,
}
