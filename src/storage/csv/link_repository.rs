use anyhow::{anyhow, Result};
use csv::{Reader, Writer};
use log::{info, warn};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use super::child_repository::parse_timestamp;
use super::connection::CsvConnection;
use crate::domain::models::guardian::ChildGuardianLink;
use crate::storage::LinkStorage;

const HEADER: [&str; 7] = [
    "id",
    "child_id",
    "guardian_id",
    "relationship",
    "is_active",
    "created_at",
    "updated_at",
];

/// CSV-based child-guardian link repository. Rows are soft-deactivated,
/// never removed, so the authorization history survives.
#[derive(Clone)]
pub struct LinkRepository {
    connection: Arc<CsvConnection>,
}

impl LinkRepository {
    /// Create a new CSV link repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    fn read_links(&self) -> Result<Vec<ChildGuardianLink>> {
        let file_path = self.connection.links_file();
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        let mut links = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            let relationship = record.get(3).unwrap_or("");
            links.push(ChildGuardianLink {
                id: record.get(0).unwrap_or("").to_string(),
                child_id: record.get(1).unwrap_or("").to_string(),
                guardian_id: record.get(2).unwrap_or("").to_string(),
                relationship: if relationship.is_empty() {
                    None
                } else {
                    Some(relationship.to_string())
                },
                is_active: record.get(4).unwrap_or("true") == "true",
                created_at: parse_timestamp(record.get(5).unwrap_or(""))?,
                updated_at: parse_timestamp(record.get(6).unwrap_or(""))?,
            });
        }
        Ok(links)
    }

    fn write_links(&self, links: &[ChildGuardianLink]) -> Result<()> {
        let mut csv_writer = Writer::from_writer(Vec::new());
        csv_writer.write_record(HEADER)?;

        for link in links {
            csv_writer.write_record(&[
                link.id.clone(),
                link.child_id.clone(),
                link.guardian_id.clone(),
                link.relationship.clone().unwrap_or_default(),
                link.is_active.to_string(),
                link.created_at.to_rfc3339(),
                link.updated_at.to_rfc3339(),
            ])?;
        }

        let buffer = csv_writer
            .into_inner()
            .map_err(|e| anyhow!("failed to flush links table: {}", e))?;
        self.connection
            .write_atomic(&self.connection.links_file(), &buffer)
    }
}

impl LinkStorage for LinkRepository {
    /// Store a new link
    fn store_link(&self, link: &ChildGuardianLink) -> Result<()> {
        let mut links = self.read_links()?;
        links.push(link.clone());
        self.write_links(&links)?;
        info!(
            "Linked guardian {} to child {} ({})",
            link.guardian_id, link.child_id, link.id
        );
        Ok(())
    }

    /// Find the link row for a (child, guardian) pair, active or not
    fn get_link(&self, child_id: &str, guardian_id: &str) -> Result<Option<ChildGuardianLink>> {
        let links = self.read_links()?;
        Ok(links
            .into_iter()
            .find(|l| l.child_id == child_id && l.guardian_id == guardian_id))
    }

    /// List all links (active and inactive) for a child
    fn links_for_child(&self, child_id: &str) -> Result<Vec<ChildGuardianLink>> {
        let links = self.read_links()?;
        Ok(links.into_iter().filter(|l| l.child_id == child_id).collect())
    }

    /// Update an existing link
    fn update_link(&self, link: &ChildGuardianLink) -> Result<()> {
        let mut links = self.read_links()?;
        match links.iter_mut().find(|l| l.id == link.id) {
            Some(existing) => *existing = link.clone(),
            None => {
                warn!("Attempted to update a non-existent link: {}", link.id);
                return Err(anyhow!("link not found for update: {}", link.id));
            }
        }
        self.write_links(&links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_repo() -> (LinkRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        (LinkRepository::new(Arc::new(connection)), temp_dir)
    }

    fn sample_link(id: &str, child_id: &str, guardian_id: &str) -> ChildGuardianLink {
        let now = chrono::Utc::now();
        ChildGuardianLink {
            id: id.to_string(),
            child_id: child_id.to_string(),
            guardian_id: guardian_id.to_string(),
            relationship: Some("mother".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_store_and_lookup_link() {
        let (repo, _temp_dir) = setup_test_repo();
        repo.store_link(&sample_link("link::1", "child::1", "guardian::1")).unwrap();

        let link = repo.get_link("child::1", "guardian::1").unwrap().unwrap();
        assert_eq!(link.relationship.as_deref(), Some("mother"));
        assert!(repo.get_link("child::1", "guardian::other").unwrap().is_none());
    }

    #[test]
    fn test_links_for_child_includes_inactive() {
        let (repo, _temp_dir) = setup_test_repo();
        repo.store_link(&sample_link("link::1", "child::1", "guardian::1")).unwrap();
        let mut second = sample_link("link::2", "child::1", "guardian::2");
        second.is_active = false;
        repo.store_link(&second).unwrap();
        repo.store_link(&sample_link("link::3", "child::other", "guardian::1")).unwrap();

        let links = repo.links_for_child("child::1").unwrap();
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_update_link_deactivates_in_place() {
        let (repo, _temp_dir) = setup_test_repo();
        let mut link = sample_link("link::1", "child::1", "guardian::1");
        repo.store_link(&link).unwrap();

        link.is_active = false;
        link.updated_at = chrono::Utc::now();
        repo.update_link(&link).unwrap();

        let stored = repo.get_link("child::1", "guardian::1").unwrap().unwrap();
        assert!(!stored.is_active);
        // Still exactly one row for the pair.
        assert_eq!(repo.links_for_child("child::1").unwrap().len(), 1);
    }
}
