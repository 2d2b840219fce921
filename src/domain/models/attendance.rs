use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::age_bucket::AgeBucket;

/// Durable audit record of one child's presence on one service date.
///
/// Created exactly once per check-in, mutated exactly once by checkout,
/// never deleted. `checked_out_at == None` means the child is still
/// present ("open" record). At most one record exists per
/// (child, service date) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub child_id: String,
    /// The weekly occurrence this record belongs to, not a timestamp.
    pub service_date: NaiveDate,
    /// Frozen at check-in time; never recomputed from current age.
    pub age_bucket: AgeBucket,
    pub checked_in_at: DateTime<Utc>,
    pub check_in_guardian_id: String,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub check_out_guardian_id: Option<String>,
}

impl AttendanceRecord {
    /// Generate a unique ID for an attendance record
    pub fn generate_id() -> String {
        format!("att::{}", Uuid::new_v4())
    }

    pub fn is_open(&self) -> bool {
        self.checked_out_at.is_none()
    }
}

/// One roster row: an attendance record joined to child display fields.
///
/// `child_name` is a placeholder when the child row is missing; the
/// roster must show a row for every record that exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub record: AttendanceRecord,
    pub child_name: String,
    pub allergies: String,
    pub child_found: bool,
}

/// All roster entries for one age bucket, ordered by check-in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterGroup {
    pub bucket: AgeBucket,
    pub entries: Vec<RosterEntry>,
}

/// The assembled roster for one service date, grouped by age bucket in
/// fixed display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub service_date: NaiveDate,
    pub groups: Vec<RosterGroup>,
}

impl Roster {
    pub fn total_count(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    pub fn open_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| g.entries.iter())
            .filter(|e| e.record.is_open())
            .count()
    }
}
