use chrono::Utc;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::age_bucket::{self, BUCKET_ORDER};
use crate::domain::child_service::ChildService;
use crate::domain::commands::attendance::{
    CheckInCommand, CheckInResult, CheckOutCommand, CheckOutResult, RosterQuery, RosterResult,
};
use crate::domain::commands::child::GetChildCommand;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::guardian_service::GuardianService;
use crate::domain::models::attendance::{
    AttendanceRecord, Roster, RosterEntry, RosterGroup,
};
use crate::storage::csv::{AttendanceRepository, CsvConnection, EventSettings, SettingsRepository};
use crate::storage::{is_uniqueness_violation, AttendanceStorage};

/// Service enforcing the attendance lifecycle: check-in, check-out, and
/// per-service-date roster assembly.
#[derive(Clone)]
pub struct AttendanceService {
    attendance_repository: AttendanceRepository,
    settings_repository: SettingsRepository,
    child_service: ChildService,
    guardian_service: GuardianService,
}

impl AttendanceService {
    /// Create a new AttendanceService
    pub fn new(
        csv_conn: Arc<CsvConnection>,
        child_service: ChildService,
        guardian_service: GuardianService,
    ) -> Self {
        Self {
            attendance_repository: AttendanceRepository::new(csv_conn.clone()),
            settings_repository: SettingsRepository::new(csv_conn),
            child_service,
            guardian_service,
        }
    }

    /// Current event settings (weekday and classification cutoff).
    pub fn event_settings(&self) -> DomainResult<EventSettings> {
        Ok(self.settings_repository.load()?)
    }

    /// Check a child in for a service date.
    ///
    /// The guardian must be an active, linked guardian for the child.
    /// The age bucket is computed from the child's birthdate and the
    /// configured cutoff date and frozen on the record. A second check-in
    /// for the same (child, date) is rejected; the repository's
    /// uniqueness guard is authoritative even if a concurrent check-in
    /// slipped in between our read and the insert.
    pub fn check_in(&self, command: CheckInCommand) -> DomainResult<CheckInResult> {
        info!(
            "Check-in: child={}, guardian={}, date={}",
            command.child_id, command.guardian_id, command.service_date
        );

        let child = self
            .child_service
            .get_child(GetChildCommand {
                child_id: command.child_id.clone(),
            })?
            .child
            .ok_or_else(|| DomainError::NotFound(format!("child {}", command.child_id)))?;

        if !child.is_active {
            return Err(DomainError::Validation(format!(
                "{} is no longer an active child profile",
                child.full_name()
            )));
        }

        self.ensure_guardian_authorized(&command.child_id, &command.guardian_id)?;

        // Fast pre-check for a friendlier error; the insert below is the
        // real guard.
        if self
            .attendance_repository
            .find_record_for_child(command.service_date, &command.child_id)?
            .is_some()
        {
            return Err(DomainError::AlreadyCheckedIn {
                child_id: command.child_id,
                service_date: command.service_date,
            });
        }

        let settings = self.settings_repository.load()?;
        let bucket = age_bucket::classify(child.birthdate, settings.classification_cutoff);

        let record = AttendanceRecord {
            id: AttendanceRecord::generate_id(),
            child_id: command.child_id.clone(),
            service_date: command.service_date,
            age_bucket: bucket,
            checked_in_at: Utc::now(),
            check_in_guardian_id: command.guardian_id,
            checked_out_at: None,
            check_out_guardian_id: None,
        };

        if let Err(err) = self.attendance_repository.store_record(&record) {
            if is_uniqueness_violation(&err) {
                return Err(DomainError::AlreadyCheckedIn {
                    child_id: command.child_id,
                    service_date: command.service_date,
                });
            }
            return Err(err.into());
        }

        info!(
            "Checked in {} under {} for {}",
            child.full_name(),
            bucket.display_name(),
            command.service_date
        );
        Ok(CheckInResult { record })
    }

    /// Check a child out.
    ///
    /// Any active linked guardian may collect the child, not only the
    /// one who dropped them off. Checking out an already-closed record
    /// is a no-op success; the original checkout fields are never
    /// overwritten.
    pub fn check_out(&self, command: CheckOutCommand) -> DomainResult<CheckOutResult> {
        info!(
            "Check-out: record={}, guardian={}, date={}",
            command.attendance_id, command.guardian_id, command.service_date
        );

        let mut record = self
            .attendance_repository
            .get_record(command.service_date, &command.attendance_id)?
            .ok_or_else(|| {
                DomainError::NotFound(format!("attendance record {}", command.attendance_id))
            })?;

        if !record.is_open() {
            info!(
                "Record {} already closed at {:?}; treating as no-op",
                record.id, record.checked_out_at
            );
            return Ok(CheckOutResult {
                record,
                already_checked_out: true,
            });
        }

        self.ensure_guardian_authorized(&record.child_id, &command.guardian_id)?;

        record.checked_out_at = Some(Utc::now());
        record.check_out_guardian_id = Some(command.guardian_id);
        self.attendance_repository.update_record(&record)?;

        info!("Checked out record {} for child {}", record.id, record.child_id);
        Ok(CheckOutResult {
            record,
            already_checked_out: false,
        })
    }

    /// Assemble the roster for a service date: every record joined to
    /// child display fields, grouped by age bucket in fixed order,
    /// ordered inside each bucket by check-in time.
    pub fn roster_for_date(&self, query: RosterQuery) -> DomainResult<RosterResult> {
        let records = self.attendance_repository.records_for_date(query.service_date)?;

        let mut by_bucket: HashMap<_, Vec<RosterEntry>> = HashMap::new();
        for record in records {
            let entry = match self
                .child_service
                .get_child(GetChildCommand {
                    child_id: record.child_id.clone(),
                })?
                .child
            {
                Some(child) => RosterEntry {
                    child_name: child.full_name(),
                    allergies: child.allergies,
                    child_found: true,
                    record,
                },
                None => {
                    // Referential inconsistency: the record must still
                    // show up rather than silently shrinking the count.
                    warn!(
                        "Attendance record {} references missing child {}",
                        record.id, record.child_id
                    );
                    RosterEntry {
                        child_name: format!("Unknown child ({})", record.child_id),
                        allergies: String::new(),
                        child_found: false,
                        record,
                    }
                }
            };
            by_bucket.entry(entry.record.age_bucket).or_default().push(entry);
        }

        let mut groups = Vec::new();
        for bucket in BUCKET_ORDER {
            let mut entries = by_bucket.remove(&bucket).unwrap_or_default();
            entries.sort_by_key(|e| e.record.checked_in_at);
            groups.push(RosterGroup { bucket, entries });
        }

        Ok(RosterResult {
            roster: Roster {
                service_date: query.service_date,
                groups,
            },
        })
    }

    /// Release authorization: only an active link to an active guardian
    /// authorizes check-in or collection.
    fn ensure_guardian_authorized(&self, child_id: &str, guardian_id: &str) -> DomainResult<()> {
        let authorized = self
            .guardian_service
            .active_guardians_for_child(child_id)?
            .iter()
            .any(|g| g.id == guardian_id);
        if !authorized {
            warn!(
                "Guardian {} is not authorized for child {}",
                guardian_id, child_id
            );
            return Err(DomainError::GuardianNotAuthorized {
                child_id: child_id.to_string(),
                guardian_id: guardian_id.to_string(),
            });
        }
        Ok(())
    }
}
