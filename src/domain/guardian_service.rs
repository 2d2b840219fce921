use chrono::Utc;
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::commands::guardian::{
    CreateGuardianCommand, CreateGuardianResult, GuardianSearchQuery, GuardianSearchResult,
    LinkGuardianCommand, LinkGuardianResult, UnlinkGuardianCommand, UnlinkGuardianResult,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::guardian::{ChildGuardianLink, Guardian as DomainGuardian};
use crate::domain::search_coordinator::{MIN_SEARCH_TERM_LEN, SEARCH_PAGE_SIZE};
use crate::storage::csv::{CsvConnection, GuardianRepository, LinkRepository};
use crate::storage::{is_uniqueness_violation, GuardianStorage, LinkStorage};

/// Service for the guardian directory: search, creation with duplicate
/// suppression, and authorization links to children.
#[derive(Clone)]
pub struct GuardianService {
    guardian_repository: GuardianRepository,
    link_repository: LinkRepository,
}

impl GuardianService {
    /// Create a new GuardianService
    pub fn new(csv_conn: Arc<CsvConnection>) -> Self {
        Self {
            guardian_repository: GuardianRepository::new(csv_conn.clone()),
            link_repository: LinkRepository::new(csv_conn),
        }
    }

    /// Search guardians by name or phone, excluding ids the caller has
    /// already picked. Terms shorter than the minimum return an empty
    /// result without touching storage.
    pub fn search(&self, query: GuardianSearchQuery) -> DomainResult<GuardianSearchResult> {
        let term = query.term.trim();
        if term.len() < MIN_SEARCH_TERM_LEN {
            return Ok(GuardianSearchResult { guardians: Vec::new() });
        }

        let excluded: HashSet<&str> = query.exclude_ids.iter().map(|s| s.as_str()).collect();
        let mut guardians: Vec<DomainGuardian> = self
            .guardian_repository
            .search_guardians(term)?
            .into_iter()
            .filter(|g| !excluded.contains(g.id.as_str()))
            .collect();
        guardians.truncate(SEARCH_PAGE_SIZE);

        info!("Guardian search '{}' matched {} guardians", term, guardians.len());
        Ok(GuardianSearchResult { guardians })
    }

    /// Create a new guardian. A uniqueness violation on the
    /// (first, last, phone) triple surfaces as the recoverable
    /// [`DomainError::DuplicateGuardian`], not a generic failure.
    pub fn create_guardian(
        &self,
        command: CreateGuardianCommand,
    ) -> DomainResult<CreateGuardianResult> {
        info!(
            "Creating guardian: name={} {}, phone={}",
            command.first_name, command.last_name, command.phone
        );

        if command.first_name.trim().is_empty() {
            return Err(DomainError::Validation("First name is required".to_string()));
        }
        if command.phone.trim().is_empty() {
            return Err(DomainError::Validation("Phone number is required".to_string()));
        }

        let now = Utc::now();
        let guardian = DomainGuardian {
            id: DomainGuardian::generate_id(),
            first_name: command.first_name.trim().to_string(),
            last_name: command.last_name.trim().to_string(),
            phone: command.phone.trim().to_string(),
            approved_by: command.approved_by,
            approval_channel: command.approval_channel,
            approved_at: command.approval_channel.map(|_| now),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self.guardian_repository.store_guardian(&guardian) {
            if is_uniqueness_violation(&err) {
                return Err(DomainError::DuplicateGuardian(guardian.full_name()));
            }
            return Err(err.into());
        }

        info!("Created guardian: {} with ID: {}", guardian.full_name(), guardian.id);
        Ok(CreateGuardianResult { guardian })
    }

    /// Link a guardian to a child. Idempotent: an existing row for the
    /// pair (active or deactivated) is reactivated, with the
    /// relationship updated when supplied; otherwise a new row is
    /// inserted.
    pub fn link_to_child(&self, command: LinkGuardianCommand) -> DomainResult<LinkGuardianResult> {
        let guardian = self
            .guardian_repository
            .get_guardian(&command.guardian_id)?
            .ok_or_else(|| DomainError::NotFound(format!("guardian {}", command.guardian_id)))?;

        if let Some(mut link) = self
            .link_repository
            .get_link(&command.child_id, &command.guardian_id)?
        {
            link.is_active = true;
            if command.relationship.is_some() {
                link.relationship = command.relationship;
            }
            link.updated_at = Utc::now();
            self.link_repository.update_link(&link)?;
            info!(
                "Reactivated link between guardian {} and child {}",
                guardian.id, command.child_id
            );
            return Ok(LinkGuardianResult { link, reactivated: true });
        }

        let now = Utc::now();
        let link = ChildGuardianLink {
            id: ChildGuardianLink::generate_id(),
            child_id: command.child_id,
            guardian_id: command.guardian_id,
            relationship: command.relationship,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.link_repository.store_link(&link)?;
        Ok(LinkGuardianResult { link, reactivated: false })
    }

    /// Deactivate the link for a (child, guardian) pair. The row stays
    /// for audit history.
    pub fn unlink_from_child(
        &self,
        command: UnlinkGuardianCommand,
    ) -> DomainResult<UnlinkGuardianResult> {
        let mut link = self
            .link_repository
            .get_link(&command.child_id, &command.guardian_id)?
            .ok_or_else(|| {
                DomainError::NotFound(format!(
                    "link between child {} and guardian {}",
                    command.child_id, command.guardian_id
                ))
            })?;

        link.is_active = false;
        link.updated_at = Utc::now();
        self.link_repository.update_link(&link)?;
        info!(
            "Deactivated link between guardian {} and child {}",
            command.guardian_id, command.child_id
        );
        Ok(UnlinkGuardianResult { link })
    }

    /// All guardians currently authorized for a child: reachable via an
    /// active link, de-duplicated, and excluding guardians whose own
    /// active flag has since been cleared.
    pub fn active_guardians_for_child(&self, child_id: &str) -> DomainResult<Vec<DomainGuardian>> {
        let links = self.link_repository.links_for_child(child_id)?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut guardians = Vec::new();
        for link in links.into_iter().filter(|l| l.is_active) {
            if !seen.insert(link.guardian_id.clone()) {
                continue;
            }
            match self.guardian_repository.get_guardian(&link.guardian_id)? {
                Some(guardian) if guardian.is_active => guardians.push(guardian),
                Some(_) => {
                    // Active link to a deactivated guardian; the link
                    // alone is not authority enough.
                }
                None => {
                    warn!(
                        "Link {} references missing guardian {}",
                        link.id, link.guardian_id
                    );
                }
            }
        }

        guardians.sort_by_key(|g| g.full_name());
        Ok(guardians)
    }

    /// The relationship label recorded on the active link for a pair,
    /// if any.
    pub fn relationship_for(
        &self,
        child_id: &str,
        guardian_id: &str,
    ) -> DomainResult<Option<String>> {
        Ok(self
            .link_repository
            .get_link(child_id, guardian_id)?
            .filter(|l| l.is_active)
            .and_then(|l| l.relationship))
    }
}
