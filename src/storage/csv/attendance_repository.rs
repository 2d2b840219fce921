use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use csv::{Reader, Writer};
use log::{info, warn};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use super::child_repository::parse_timestamp;
use super::connection::CsvConnection;
use crate::domain::age_bucket::AgeBucket;
use crate::domain::models::attendance::AttendanceRecord;
use crate::storage::{AttendanceStorage, UniquenessViolation};

const HEADER: [&str; 8] = [
    "id",
    "child_id",
    "service_date",
    "age_bucket",
    "checked_in_at",
    "check_in_guardian_id",
    "checked_out_at",
    "check_out_guardian_id",
];

/// CSV-based attendance repository, one file per service date.
///
/// The insert path is the store-level authority for the one-record-per
/// (child, service date) invariant: a second insert for the same child
/// fails with a typed [`UniquenessViolation`] instead of writing a
/// second row and corrupting the roster count.
#[derive(Clone)]
pub struct AttendanceRepository {
    connection: Arc<CsvConnection>,
}

impl AttendanceRepository {
    /// Create a new CSV attendance repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    fn read_records(&self, service_date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        let file_path = self.connection.attendance_file(service_date);
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        let mut records = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            records.push(parse_attendance_record(&record)?);
        }
        Ok(records)
    }

    fn write_records(&self, service_date: NaiveDate, records: &[AttendanceRecord]) -> Result<()> {
        let mut csv_writer = Writer::from_writer(Vec::new());
        csv_writer.write_record(HEADER)?;

        for record in records {
            csv_writer.write_record(&[
                record.id.clone(),
                record.child_id.clone(),
                record.service_date.format("%Y-%m-%d").to_string(),
                record.age_bucket.as_str().to_string(),
                record.checked_in_at.to_rfc3339(),
                record.check_in_guardian_id.clone(),
                record
                    .checked_out_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
                record.check_out_guardian_id.clone().unwrap_or_default(),
            ])?;
        }

        let buffer = csv_writer
            .into_inner()
            .map_err(|e| anyhow!("failed to flush attendance table: {}", e))?;
        self.connection
            .write_atomic(&self.connection.attendance_file(service_date), &buffer)
    }
}

fn parse_attendance_record(record: &csv::StringRecord) -> Result<AttendanceRecord> {
    let date_field = record.get(2).unwrap_or("");
    let bucket_field = record.get(3).unwrap_or("");
    let checked_out_field = record.get(6).unwrap_or("");
    let out_guardian_field = record.get(7).unwrap_or("");

    Ok(AttendanceRecord {
        id: record.get(0).unwrap_or("").to_string(),
        child_id: record.get(1).unwrap_or("").to_string(),
        service_date: NaiveDate::parse_from_str(date_field, "%Y-%m-%d")
            .map_err(|e| anyhow!("failed to parse service date '{}': {}", date_field, e))?,
        age_bucket: AgeBucket::parse(bucket_field)
            .ok_or_else(|| anyhow!("unknown age bucket '{}'", bucket_field))?,
        checked_in_at: parse_timestamp(record.get(4).unwrap_or(""))?,
        check_in_guardian_id: record.get(5).unwrap_or("").to_string(),
        checked_out_at: if checked_out_field.is_empty() {
            None
        } else {
            Some(parse_timestamp(checked_out_field)?)
        },
        check_out_guardian_id: if out_guardian_field.is_empty() {
            None
        } else {
            Some(out_guardian_field.to_string())
        },
    })
}

impl AttendanceStorage for AttendanceRepository {
    /// Store a new attendance record, enforcing the per-date uniqueness
    fn store_record(&self, record: &AttendanceRecord) -> Result<()> {
        let mut records = self.read_records(record.service_date)?;

        if records.iter().any(|r| r.child_id == record.child_id) {
            warn!(
                "Refusing second attendance record for child {} on {}",
                record.child_id, record.service_date
            );
            return Err(UniquenessViolation {
                constraint: "attendance child+service_date",
                detail: format!("{} / {}", record.child_id, record.service_date),
            }
            .into());
        }

        records.push(record.clone());
        self.write_records(record.service_date, &records)?;
        info!(
            "Stored attendance record {} for child {} on {}",
            record.id, record.child_id, record.service_date
        );
        Ok(())
    }

    /// Retrieve a specific record by ID for a given service date
    fn get_record(
        &self,
        service_date: NaiveDate,
        record_id: &str,
    ) -> Result<Option<AttendanceRecord>> {
        let records = self.read_records(service_date)?;
        Ok(records.into_iter().find(|r| r.id == record_id))
    }

    /// Find a child's record (open or closed) for a service date
    fn find_record_for_child(
        &self,
        service_date: NaiveDate,
        child_id: &str,
    ) -> Result<Option<AttendanceRecord>> {
        let records = self.read_records(service_date)?;
        Ok(records.into_iter().find(|r| r.child_id == child_id))
    }

    /// All records for a service date
    fn records_for_date(&self, service_date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        self.read_records(service_date)
    }

    /// Update an existing record (checkout)
    fn update_record(&self, record: &AttendanceRecord) -> Result<()> {
        let mut records = self.read_records(record.service_date)?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => {
                warn!("Attempted to update a non-existent attendance record: {}", record.id);
                return Err(anyhow!("attendance record not found for update: {}", record.id));
            }
        }
        self.write_records(record.service_date, &records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::is_uniqueness_violation;
    use tempfile::TempDir;

    fn setup_test_repo() -> (AttendanceRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        (AttendanceRepository::new(Arc::new(connection)), temp_dir)
    }

    fn service_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 8).unwrap()
    }

    fn sample_record(id: &str, child_id: &str) -> AttendanceRecord {
        AttendanceRecord {
            id: id.to_string(),
            child_id: child_id.to_string(),
            service_date: service_date(),
            age_bucket: AgeBucket::Primary,
            checked_in_at: chrono::Utc::now(),
            check_in_guardian_id: "guardian::1".to_string(),
            checked_out_at: None,
            check_out_guardian_id: None,
        }
    }

    #[test]
    fn test_store_and_read_back() {
        let (repo, _temp_dir) = setup_test_repo();
        repo.store_record(&sample_record("att::1", "child::1")).unwrap();

        let found = repo.get_record(service_date(), "att::1").unwrap().unwrap();
        assert!(found.is_open());
        assert_eq!(found.age_bucket, AgeBucket::Primary);
    }

    #[test]
    fn test_second_record_for_child_and_date_is_a_violation() {
        let (repo, _temp_dir) = setup_test_repo();
        repo.store_record(&sample_record("att::1", "child::1")).unwrap();

        let err = repo.store_record(&sample_record("att::2", "child::1")).unwrap_err();
        assert!(is_uniqueness_violation(&err));
        assert_eq!(repo.records_for_date(service_date()).unwrap().len(), 1);
    }

    #[test]
    fn test_same_child_different_dates_is_fine() {
        let (repo, _temp_dir) = setup_test_repo();
        repo.store_record(&sample_record("att::1", "child::1")).unwrap();

        let mut next_week = sample_record("att::2", "child::1");
        next_week.service_date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        repo.store_record(&next_week).unwrap();

        assert_eq!(repo.records_for_date(service_date()).unwrap().len(), 1);
        assert_eq!(
            repo.records_for_date(next_week.service_date).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_checkout_fields_round_trip() {
        let (repo, _temp_dir) = setup_test_repo();
        let mut record = sample_record("att::1", "child::1");
        repo.store_record(&record).unwrap();

        record.checked_out_at = Some(chrono::Utc::now());
        record.check_out_guardian_id = Some("guardian::2".to_string());
        repo.update_record(&record).unwrap();

        let found = repo.get_record(service_date(), "att::1").unwrap().unwrap();
        assert!(!found.is_open());
        assert_eq!(found.check_out_guardian_id.as_deref(), Some("guardian::2"));
    }

    #[test]
    fn test_find_record_for_child() {
        let (repo, _temp_dir) = setup_test_repo();
        repo.store_record(&sample_record("att::1", "child::1")).unwrap();
        repo.store_record(&sample_record("att::2", "child::2")).unwrap();

        let found = repo.find_record_for_child(service_date(), "child::2").unwrap().unwrap();
        assert_eq!(found.id, "att::2");
        assert!(repo
            .find_record_for_child(service_date(), "child::3")
            .unwrap()
            .is_none());
    }
}
