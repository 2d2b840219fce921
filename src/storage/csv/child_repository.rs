use anyhow::{anyhow, Result};
use csv::{Reader, Writer};
use log::{info, warn};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use super::connection::CsvConnection;
use crate::domain::models::child::Child as DomainChild;
use crate::storage::ChildStorage;

const HEADER: [&str; 9] = [
    "id",
    "first_name",
    "last_name",
    "birthdate",
    "allergies",
    "medical_notes",
    "is_active",
    "created_at",
    "updated_at",
];

/// CSV-based child repository: one table file, rewritten whole on every
/// mutation with an atomic rename.
#[derive(Clone)]
pub struct ChildRepository {
    connection: Arc<CsvConnection>,
}

impl ChildRepository {
    /// Create a new CSV child repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    /// Read all children from the table file
    fn read_children(&self) -> Result<Vec<DomainChild>> {
        let file_path = self.connection.children_file();
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        let mut children = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            children.push(parse_child_record(&record)?);
        }
        Ok(children)
    }

    /// Rewrite the whole table file atomically
    fn write_children(&self, children: &[DomainChild]) -> Result<()> {
        let mut csv_writer = Writer::from_writer(Vec::new());
        csv_writer.write_record(HEADER)?;

        for child in children {
            csv_writer.write_record(&[
                child.id.clone(),
                child.first_name.clone(),
                child.last_name.clone(),
                child
                    .birthdate
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                child.allergies.clone(),
                child.medical_notes.clone(),
                child.is_active.to_string(),
                child.created_at.to_rfc3339(),
                child.updated_at.to_rfc3339(),
            ])?;
        }

        let buffer = csv_writer
            .into_inner()
            .map_err(|e| anyhow!("failed to flush children table: {}", e))?;
        self.connection
            .write_atomic(&self.connection.children_file(), &buffer)
    }
}

fn parse_child_record(record: &csv::StringRecord) -> Result<DomainChild> {
    let birthdate_field = record.get(3).unwrap_or("");
    let birthdate = if birthdate_field.is_empty() {
        None
    } else {
        Some(
            chrono::NaiveDate::parse_from_str(birthdate_field, "%Y-%m-%d")
                .map_err(|e| anyhow!("failed to parse birthdate '{}': {}", birthdate_field, e))?,
        )
    };

    Ok(DomainChild {
        id: record.get(0).unwrap_or("").to_string(),
        first_name: record.get(1).unwrap_or("").to_string(),
        last_name: record.get(2).unwrap_or("").to_string(),
        birthdate,
        allergies: record.get(4).unwrap_or("").to_string(),
        medical_notes: record.get(5).unwrap_or("").to_string(),
        is_active: record.get(6).unwrap_or("true") == "true",
        created_at: parse_timestamp(record.get(7).unwrap_or(""))?,
        updated_at: parse_timestamp(record.get(8).unwrap_or(""))?,
    })
}

pub(super) fn parse_timestamp(value: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| anyhow!("failed to parse timestamp '{}': {}", value, e))
}

impl ChildStorage for ChildRepository {
    /// Store a new child
    fn store_child(&self, child: &DomainChild) -> Result<()> {
        let mut children = self.read_children()?;
        children.push(child.clone());
        self.write_children(&children)?;
        info!("Stored child {} ({})", child.full_name(), child.id);
        Ok(())
    }

    /// Retrieve a specific child by ID
    fn get_child(&self, child_id: &str) -> Result<Option<DomainChild>> {
        let children = self.read_children()?;
        Ok(children.into_iter().find(|c| c.id == child_id))
    }

    /// List all children ordered by name
    fn list_children(&self) -> Result<Vec<DomainChild>> {
        let mut children = self.read_children()?;
        children.sort_by(|a, b| a.full_name().cmp(&b.full_name()));
        Ok(children)
    }

    /// Case-insensitive substring search over first/last name
    fn search_children(&self, term: &str) -> Result<Vec<DomainChild>> {
        let needle = term.to_lowercase();
        let mut matches: Vec<DomainChild> = self
            .read_children()?
            .into_iter()
            .filter(|c| c.is_active)
            .filter(|c| {
                c.first_name.to_lowercase().contains(&needle)
                    || c.last_name.to_lowercase().contains(&needle)
                    || c.full_name().to_lowercase().contains(&needle)
            })
            .collect();
        matches.sort_by(|a, b| a.full_name().cmp(&b.full_name()));
        Ok(matches)
    }

    /// Update an existing child
    fn update_child(&self, child: &DomainChild) -> Result<()> {
        let mut children = self.read_children()?;
        match children.iter_mut().find(|c| c.id == child.id) {
            Some(existing) => *existing = child.clone(),
            None => {
                warn!("Attempted to update a non-existent child: {}", child.id);
                return Err(anyhow!("child not found for update: {}", child.id));
            }
        }
        self.write_children(&children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn setup_test_repo() -> (ChildRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        (ChildRepository::new(Arc::new(connection)), temp_dir)
    }

    fn sample_child(id: &str, first: &str, last: &str) -> DomainChild {
        let now = chrono::Utc::now();
        DomainChild {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            birthdate: NaiveDate::from_ymd_opt(2018, 3, 14),
            allergies: "peanuts".to_string(),
            medical_notes: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_store_and_get_child() {
        let (repo, _temp_dir) = setup_test_repo();
        let child = sample_child("child::1", "Mia", "Torres");
        repo.store_child(&child).unwrap();

        let found = repo.get_child("child::1").unwrap().unwrap();
        assert_eq!(found.first_name, "Mia");
        assert_eq!(found.birthdate, NaiveDate::from_ymd_opt(2018, 3, 14));
        assert_eq!(found.allergies, "peanuts");

        assert!(repo.get_child("child::missing").unwrap().is_none());
    }

    #[test]
    fn test_search_is_case_insensitive_and_active_only() {
        let (repo, _temp_dir) = setup_test_repo();
        repo.store_child(&sample_child("child::1", "Anabel", "Reyes")).unwrap();
        repo.store_child(&sample_child("child::2", "Joan", "Anders")).unwrap();
        let mut inactive = sample_child("child::3", "Ana", "Gone");
        inactive.is_active = false;
        repo.store_child(&inactive).unwrap();

        let matches = repo.search_children("AN").unwrap();
        let ids: Vec<&str> = matches.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["child::1", "child::2"]);
    }

    #[test]
    fn test_search_matches_full_name_across_the_space() {
        let (repo, _temp_dir) = setup_test_repo();
        repo.store_child(&sample_child("child::1", "Mia", "Torres")).unwrap();
        let matches = repo.search_children("mia tor").unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_update_child_roundtrip() {
        let (repo, _temp_dir) = setup_test_repo();
        let mut child = sample_child("child::1", "Mia", "Torres");
        repo.store_child(&child).unwrap();

        child.allergies = "none".to_string();
        child.is_active = false;
        repo.update_child(&child).unwrap();

        let found = repo.get_child("child::1").unwrap().unwrap();
        assert_eq!(found.allergies, "none");
        assert!(!found.is_active);
    }

    #[test]
    fn test_update_missing_child_fails() {
        let (repo, _temp_dir) = setup_test_repo();
        let child = sample_child("child::ghost", "No", "One");
        assert!(repo.update_child(&child).is_err());
    }

    #[test]
    fn test_missing_birthdate_round_trips_as_none() {
        let (repo, _temp_dir) = setup_test_repo();
        let mut child = sample_child("child::1", "Mia", "Torres");
        child.birthdate = None;
        repo.store_child(&child).unwrap();
        assert!(repo.get_child("child::1").unwrap().unwrap().birthdate.is_none());
    }
}
