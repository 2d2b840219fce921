use chrono::{NaiveDate, Utc};
use log::{info, warn};
use std::sync::Arc;

use crate::domain::commands::child::{
    ChildSearchQuery, ChildSearchResult, CreateChildCommand, CreateChildResult,
    DeactivateChildCommand, DeactivateChildResult, GetChildCommand, GetChildResult,
    UpdateChildCommand, UpdateChildResult,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::child::Child as DomainChild;
use crate::domain::search_coordinator::{MIN_SEARCH_TERM_LEN, SEARCH_PAGE_SIZE};
use crate::storage::csv::{ChildRepository, CsvConnection};
use crate::storage::ChildStorage;

/// Service for managing the child directory.
#[derive(Clone)]
pub struct ChildService {
    child_repository: ChildRepository,
}

impl ChildService {
    /// Create a new ChildService
    pub fn new(csv_conn: Arc<CsvConnection>) -> Self {
        let child_repository = ChildRepository::new(csv_conn);
        Self { child_repository }
    }

    /// Search children by first/last name. Terms shorter than the
    /// minimum return an empty result without touching storage.
    pub fn search(&self, query: ChildSearchQuery) -> DomainResult<ChildSearchResult> {
        let term = query.term.trim();
        if term.len() < MIN_SEARCH_TERM_LEN {
            return Ok(ChildSearchResult { children: Vec::new() });
        }

        let mut children = self.child_repository.search_children(term)?;
        children.truncate(SEARCH_PAGE_SIZE);

        info!("Child search '{}' matched {} children", term, children.len());
        Ok(ChildSearchResult { children })
    }

    /// Create a new child profile
    pub fn create_child(&self, command: CreateChildCommand) -> DomainResult<CreateChildResult> {
        info!(
            "Creating child: name={} {}, birthdate={}",
            command.first_name, command.last_name, command.birthdate
        );

        self.validate_create_command(&command)?;

        let now = Utc::now();
        let birthdate = parse_birthdate(&command.birthdate)?;

        let child = DomainChild {
            id: DomainChild::generate_id(),
            first_name: command.first_name.trim().to_string(),
            last_name: command.last_name.trim().to_string(),
            birthdate: Some(birthdate),
            allergies: command.allergies.unwrap_or_default().trim().to_string(),
            medical_notes: command.medical_notes.unwrap_or_default().trim().to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.child_repository.store_child(&child)?;
        info!("Created child: {} with ID: {}", child.full_name(), child.id);

        Ok(CreateChildResult { child })
    }

    /// Get a child by ID (zero-or-one)
    pub fn get_child(&self, command: GetChildCommand) -> DomainResult<GetChildResult> {
        let child = self.child_repository.get_child(&command.child_id)?;
        if child.is_none() {
            warn!("Child not found: {}", command.child_id);
        }
        Ok(GetChildResult { child })
    }

    /// Update an existing child's profile fields
    pub fn update_child(&self, command: UpdateChildCommand) -> DomainResult<UpdateChildResult> {
        info!("Updating child: {}", command.child_id);

        let mut child = self
            .child_repository
            .get_child(&command.child_id)?
            .ok_or_else(|| DomainError::NotFound(format!("child {}", command.child_id)))?;

        self.validate_update_command(&command)?;

        if let Some(first_name) = command.first_name {
            child.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = command.last_name {
            child.last_name = last_name.trim().to_string();
        }
        if let Some(birthdate) = command.birthdate {
            child.birthdate = Some(parse_birthdate(&birthdate)?);
        }
        if let Some(allergies) = command.allergies {
            child.allergies = allergies.trim().to_string();
        }
        if let Some(medical_notes) = command.medical_notes {
            child.medical_notes = medical_notes.trim().to_string();
        }
        child.updated_at = Utc::now();

        self.child_repository.update_child(&child)?;
        info!("Updated child: {} with ID: {}", child.full_name(), child.id);

        Ok(UpdateChildResult { child })
    }

    /// Soft-delete a child. The row survives so historical attendance
    /// stays referable; the child just stops matching searches.
    pub fn deactivate_child(
        &self,
        command: DeactivateChildCommand,
    ) -> DomainResult<DeactivateChildResult> {
        info!("Deactivating child: {}", command.child_id);

        let mut child = self
            .child_repository
            .get_child(&command.child_id)?
            .ok_or_else(|| DomainError::NotFound(format!("child {}", command.child_id)))?;

        child.is_active = false;
        child.updated_at = Utc::now();
        self.child_repository.update_child(&child)?;

        info!("Deactivated child: {} ({})", child.full_name(), child.id);
        Ok(DeactivateChildResult { child })
    }

    /// Validate create child command
    fn validate_create_command(&self, command: &CreateChildCommand) -> DomainResult<()> {
        if command.first_name.trim().is_empty() {
            return Err(DomainError::Validation("First name is required".to_string()));
        }
        if command.last_name.trim().is_empty() {
            return Err(DomainError::Validation("Last name is required".to_string()));
        }
        if command.first_name.len() > 100 || command.last_name.len() > 100 {
            return Err(DomainError::Validation(
                "Names cannot exceed 100 characters".to_string(),
            ));
        }
        if command.birthdate.trim().is_empty() {
            return Err(DomainError::Validation("Date of birth is required".to_string()));
        }
        Ok(())
    }

    /// Validate update child command
    fn validate_update_command(&self, command: &UpdateChildCommand) -> DomainResult<()> {
        if let Some(ref first_name) = command.first_name {
            if first_name.trim().is_empty() {
                return Err(DomainError::Validation("First name cannot be empty".to_string()));
            }
        }
        if let Some(ref last_name) = command.last_name {
            if last_name.trim().is_empty() {
                return Err(DomainError::Validation("Last name cannot be empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Parse an ISO 8601 (YYYY-MM-DD) birthdate, surfacing a validation
/// error rather than a storage error.
fn parse_birthdate(value: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        DomainError::Validation(format!("Invalid birthdate '{}'. Use YYYY-MM-DD.", value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup_test() -> ChildService {
        let temp_dir = tempdir().unwrap();
        let conn = CsvConnection::new(temp_dir.path().to_path_buf()).unwrap();
        // Leak the TempDir so the files outlive the setup function.
        std::mem::forget(temp_dir);
        ChildService::new(Arc::new(conn))
    }

    fn create_cmd(first: &str, last: &str, birthdate: &str) -> CreateChildCommand {
        CreateChildCommand {
            first_name: first.to_string(),
            last_name: last.to_string(),
            birthdate: birthdate.to_string(),
            allergies: None,
            medical_notes: None,
        }
    }

    #[test]
    fn test_create_child_trims_fields() {
        let service = setup_test();
        let mut cmd = create_cmd("  Mia ", " Torres ", "2018-03-14");
        cmd.allergies = Some(" peanuts ".to_string());

        let result = service.create_child(cmd).unwrap();
        assert_eq!(result.child.first_name, "Mia");
        assert_eq!(result.child.last_name, "Torres");
        assert_eq!(result.child.allergies, "peanuts");
        assert!(result.child.is_active);
    }

    #[test]
    fn test_create_child_validates_required_fields() {
        let service = setup_test();

        let err = service.create_child(create_cmd(" ", "Torres", "2018-03-14")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = service.create_child(create_cmd("Mia", "", "2018-03-14")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = service.create_child(create_cmd("Mia", "Torres", "")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = service
            .create_child(create_cmd("Mia", "Torres", "14/03/2018"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_search_short_term_returns_empty() {
        let service = setup_test();
        service.create_child(create_cmd("Anabel", "Reyes", "2017-02-01")).unwrap();

        let result = service
            .search(ChildSearchQuery { term: "a".to_string() })
            .unwrap();
        assert!(result.children.is_empty());

        let result = service
            .search(ChildSearchQuery { term: "an".to_string() })
            .unwrap();
        assert_eq!(result.children.len(), 1);
    }

    #[test]
    fn test_update_child_partial_fields() {
        let service = setup_test();
        let created = service.create_child(create_cmd("Mia", "Torres", "2018-03-14")).unwrap();

        let updated = service
            .update_child(UpdateChildCommand {
                child_id: created.child.id.clone(),
                medical_notes: Some("epipen in bag".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(updated.child.first_name, "Mia");
        assert_eq!(updated.child.medical_notes, "epipen in bag");
        assert!(updated.child.updated_at >= created.child.created_at);
    }

    #[test]
    fn test_update_nonexistent_child() {
        let service = setup_test();
        let err = service
            .update_child(UpdateChildCommand {
                child_id: "child::ghost".to_string(),
                first_name: Some("New".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn test_deactivated_child_disappears_from_search_but_not_lookup() {
        let service = setup_test();
        let created = service.create_child(create_cmd("Mia", "Torres", "2018-03-14")).unwrap();

        service
            .deactivate_child(DeactivateChildCommand {
                child_id: created.child.id.clone(),
            })
            .unwrap();

        let search = service
            .search(ChildSearchQuery { term: "mia".to_string() })
            .unwrap();
        assert!(search.children.is_empty());

        // Still referable by ID for historical rosters.
        let lookup = service
            .get_child(GetChildCommand { child_id: created.child.id })
            .unwrap();
        assert!(!lookup.child.unwrap().is_active);
    }
}
