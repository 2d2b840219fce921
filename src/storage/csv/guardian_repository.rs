use anyhow::{anyhow, Result};
use csv::{Reader, Writer};
use log::{info, warn};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use super::child_repository::parse_timestamp;
use super::connection::CsvConnection;
use crate::domain::models::guardian::{ApprovalChannel, Guardian as DomainGuardian};
use crate::storage::{GuardianStorage, UniquenessViolation};

const HEADER: [&str; 10] = [
    "id",
    "first_name",
    "last_name",
    "phone",
    "approved_by",
    "approval_channel",
    "approved_at",
    "is_active",
    "created_at",
    "updated_at",
];

/// CSV-based guardian repository.
///
/// The insert path is the store-level authority for the active-guardian
/// (first name, last name, phone) uniqueness constraint: the pre-insert
/// scan and the rewrite happen inside one call, and a violation is
/// reported as a typed [`UniquenessViolation`], not a generic error.
#[derive(Clone)]
pub struct GuardianRepository {
    connection: Arc<CsvConnection>,
}

impl GuardianRepository {
    /// Create a new CSV guardian repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    fn read_guardians(&self) -> Result<Vec<DomainGuardian>> {
        let file_path = self.connection.guardians_file();
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        let mut guardians = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            guardians.push(parse_guardian_record(&record)?);
        }
        Ok(guardians)
    }

    fn write_guardians(&self, guardians: &[DomainGuardian]) -> Result<()> {
        let mut csv_writer = Writer::from_writer(Vec::new());
        csv_writer.write_record(HEADER)?;

        for guardian in guardians {
            csv_writer.write_record(&[
                guardian.id.clone(),
                guardian.first_name.clone(),
                guardian.last_name.clone(),
                guardian.phone.clone(),
                guardian.approved_by.clone().unwrap_or_default(),
                guardian
                    .approval_channel
                    .map(|c| c.as_str().to_string())
                    .unwrap_or_default(),
                guardian
                    .approved_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
                guardian.is_active.to_string(),
                guardian.created_at.to_rfc3339(),
                guardian.updated_at.to_rfc3339(),
            ])?;
        }

        let buffer = csv_writer
            .into_inner()
            .map_err(|e| anyhow!("failed to flush guardians table: {}", e))?;
        self.connection
            .write_atomic(&self.connection.guardians_file(), &buffer)
    }

    fn same_identity(a: &DomainGuardian, b: &DomainGuardian) -> bool {
        a.first_name.eq_ignore_ascii_case(&b.first_name)
            && a.last_name.eq_ignore_ascii_case(&b.last_name)
            && a.phone == b.phone
    }
}

fn parse_guardian_record(record: &csv::StringRecord) -> Result<DomainGuardian> {
    let approved_by = record.get(4).unwrap_or("");
    let channel_field = record.get(5).unwrap_or("");
    let approved_at_field = record.get(6).unwrap_or("");

    Ok(DomainGuardian {
        id: record.get(0).unwrap_or("").to_string(),
        first_name: record.get(1).unwrap_or("").to_string(),
        last_name: record.get(2).unwrap_or("").to_string(),
        phone: record.get(3).unwrap_or("").to_string(),
        approved_by: if approved_by.is_empty() {
            None
        } else {
            Some(approved_by.to_string())
        },
        approval_channel: ApprovalChannel::parse(channel_field),
        approved_at: if approved_at_field.is_empty() {
            None
        } else {
            Some(parse_timestamp(approved_at_field)?)
        },
        is_active: record.get(7).unwrap_or("true") == "true",
        created_at: parse_timestamp(record.get(8).unwrap_or(""))?,
        updated_at: parse_timestamp(record.get(9).unwrap_or(""))?,
    })
}

impl GuardianStorage for GuardianRepository {
    /// Store a new guardian, enforcing the uniqueness constraint
    fn store_guardian(&self, guardian: &DomainGuardian) -> Result<()> {
        let mut guardians = self.read_guardians()?;

        if let Some(existing) = guardians
            .iter()
            .find(|g| g.is_active && Self::same_identity(g, guardian))
        {
            warn!(
                "Refusing to store duplicate guardian {} ({})",
                guardian.full_name(),
                guardian.phone
            );
            return Err(UniquenessViolation {
                constraint: "guardian name+phone",
                detail: format!("{} / {}", existing.full_name(), existing.phone),
            }
            .into());
        }

        guardians.push(guardian.clone());
        self.write_guardians(&guardians)?;
        info!("Stored guardian {} ({})", guardian.full_name(), guardian.id);
        Ok(())
    }

    /// Retrieve a specific guardian by ID
    fn get_guardian(&self, guardian_id: &str) -> Result<Option<DomainGuardian>> {
        let guardians = self.read_guardians()?;
        Ok(guardians.into_iter().find(|g| g.id == guardian_id))
    }

    /// Case-insensitive substring search over full name and phone
    fn search_guardians(&self, term: &str) -> Result<Vec<DomainGuardian>> {
        let needle = term.to_lowercase();
        let mut matches: Vec<DomainGuardian> = self
            .read_guardians()?
            .into_iter()
            .filter(|g| g.is_active)
            .filter(|g| {
                g.full_name().to_lowercase().contains(&needle) || g.phone.contains(&needle)
            })
            .collect();
        matches.sort_by(|a, b| a.full_name().cmp(&b.full_name()));
        Ok(matches)
    }

    /// Update an existing guardian
    fn update_guardian(&self, guardian: &DomainGuardian) -> Result<()> {
        let mut guardians = self.read_guardians()?;
        match guardians.iter_mut().find(|g| g.id == guardian.id) {
            Some(existing) => *existing = guardian.clone(),
            None => {
                warn!("Attempted to update a non-existent guardian: {}", guardian.id);
                return Err(anyhow!("guardian not found for update: {}", guardian.id));
            }
        }
        self.write_guardians(&guardians)
    }
}
