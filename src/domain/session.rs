//! The check-in desk session state machine.
//!
//! One session backs one open check-in/check-out workflow. Transitions
//! are explicit methods; every fallible transition leaves the session in
//! its pre-operation state on failure, and `cancel` is always allowed.
//!
//! Guardian-list loads triggered by selecting a child are tagged with a
//! session-local generation counter. Any load that completes after a
//! newer selection (or a cancel) has started is discarded, so a slow
//! lookup can never resurrect a child the operator already moved away
//! from.

use chrono::NaiveDate;
use log::{debug, info};

use crate::domain::attendance_service::AttendanceService;
use crate::domain::commands::attendance::{CheckInCommand, CheckInResult, CheckOutCommand, CheckOutResult};
use crate::domain::commands::child::ChildSearchQuery;
use crate::domain::commands::guardian::{
    CreateGuardianCommand, GuardianSearchQuery, LinkGuardianCommand,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::guardian_service::GuardianService;
use crate::domain::child_service::ChildService;
use crate::domain::models::attendance::AttendanceRecord;
use crate::domain::models::child::Child;
use crate::domain::models::guardian::Guardian;
use crate::domain::search_coordinator::SearchCoordinator;

/// Where the session currently stands for the selected service date.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Nothing selected; the resting state.
    Idle,
    /// The check-in flow is open and the operator is searching.
    Searching,
    /// A child is selected and has at least one authorized guardian.
    ChildSelected {
        child: Child,
        guardians: Vec<Guardian>,
    },
    /// A child is selected but no guardian is linked yet; check-in
    /// cannot complete from here.
    GuardianPending { child: Child },
    /// Check-in just completed; the roster should be refreshed.
    CheckedIn { record: AttendanceRecord },
    /// Checkout completed; terminal for this child and date.
    CheckedOut { record: AttendanceRecord },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Searching => "searching",
            SessionState::ChildSelected { .. } => "child_selected",
            SessionState::GuardianPending { .. } => "guardian_pending",
            SessionState::CheckedIn { .. } => "checked_in",
            SessionState::CheckedOut { .. } => "checked_out",
        }
    }
}

/// Ticket tagging one guardian-list load with the generation current at
/// launch time.
#[derive(Debug, Clone)]
pub struct GuardianLoadTicket {
    generation: u64,
    pub child: Child,
}

/// One operator's check-in/check-out workflow against a single service
/// date.
pub struct CheckInSession {
    child_service: ChildService,
    guardian_service: GuardianService,
    attendance_service: AttendanceService,
    service_date: NaiveDate,
    state: SessionState,
    /// Bumped on every selection change or cancel; stale completions
    /// compare against it and drop themselves.
    load_generation: u64,
    child_search: SearchCoordinator<Child>,
    guardian_search: SearchCoordinator<Guardian>,
}

impl std::fmt::Debug for CheckInSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckInSession")
            .field("service_date", &self.service_date)
            .field("state", &self.state)
            .field("load_generation", &self.load_generation)
            .finish_non_exhaustive()
    }
}

impl CheckInSession {
    pub fn new(
        child_service: ChildService,
        guardian_service: GuardianService,
        attendance_service: AttendanceService,
        service_date: NaiveDate,
    ) -> Self {
        Self {
            child_service,
            guardian_service,
            attendance_service,
            service_date,
            state: SessionState::Idle,
            load_generation: 0,
            child_search: SearchCoordinator::new(),
            guardian_search: SearchCoordinator::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn service_date(&self) -> NaiveDate {
        self.service_date
    }

    /// Point the session at a different weekly occurrence. Clears any
    /// selection in progress; the caller re-fetches the roster.
    pub fn set_service_date(&mut self, service_date: NaiveDate) {
        if self.service_date != service_date {
            self.service_date = service_date;
            self.cancel();
        }
    }

    /// `Idle -> Searching`: open the check-in flow, clearing any prior
    /// selection.
    pub fn open_search(&mut self) {
        self.load_generation += 1;
        self.child_search.reset();
        self.guardian_search.reset();
        self.state = SessionState::Searching;
    }

    /// Run a child search for the current keystroke. Stale results are
    /// handled by the coordinator; the returned list reflects whatever
    /// is current after this call.
    pub fn search_children(&mut self, term: &str) -> DomainResult<Vec<Child>> {
        let ticket = match self.child_search.begin(term) {
            Some(ticket) => ticket,
            None => return Ok(Vec::new()),
        };
        let result = self.child_service.search(ChildSearchQuery {
            term: ticket.term.clone(),
        })?;
        self.child_search.commit(&ticket, result.children);
        Ok(self.child_search.results())
    }

    /// Guardian search within the flow, excluding guardians already
    /// authorized for the selected child.
    pub fn search_guardians(&mut self, term: &str) -> DomainResult<Vec<Guardian>> {
        let exclude_ids = match &self.state {
            SessionState::ChildSelected { guardians, .. } => {
                guardians.iter().map(|g| g.id.clone()).collect()
            }
            _ => Vec::new(),
        };
        let ticket = match self.guardian_search.begin(term) {
            Some(ticket) => ticket,
            None => return Ok(Vec::new()),
        };
        let result = self.guardian_service.search(GuardianSearchQuery {
            term: ticket.term.clone(),
            exclude_ids,
        })?;
        self.guardian_search.commit(&ticket, result.guardians);
        Ok(self.guardian_search.results())
    }

    /// `Searching -> ChildSelected`/`GuardianPending`: pick one search
    /// result and load its guardians in one step.
    pub fn select_child(&mut self, child: Child) -> DomainResult<()> {
        let ticket = self.begin_guardian_load(child);
        let guardians = self
            .guardian_service
            .active_guardians_for_child(&ticket.child.id)?;
        self.complete_guardian_load(ticket, guardians);
        Ok(())
    }

    /// Launch a guardian-list load for a selected child, capturing the
    /// current generation. Used by callers that resolve the lookup out
    /// of band; `select_child` wraps it for the synchronous path.
    pub fn begin_guardian_load(&mut self, child: Child) -> GuardianLoadTicket {
        self.load_generation += 1;
        debug!(
            "Guardian load generation {} for child {}",
            self.load_generation, child.id
        );
        GuardianLoadTicket {
            generation: self.load_generation,
            child,
        }
    }

    /// Apply a completed guardian-list load, unless a newer selection
    /// or cancel has superseded it. Returns whether it was applied.
    pub fn complete_guardian_load(
        &mut self,
        ticket: GuardianLoadTicket,
        guardians: Vec<Guardian>,
    ) -> bool {
        if ticket.generation != self.load_generation {
            debug!(
                "Discarding stale guardian load for child {} (generation {})",
                ticket.child.id, ticket.generation
            );
            return false;
        }
        self.state = if guardians.is_empty() {
            SessionState::GuardianPending { child: ticket.child }
        } else {
            SessionState::ChildSelected {
                child: ticket.child,
                guardians,
            }
        };
        true
    }

    /// Link an existing guardian to the selected child and refresh the
    /// guardian list. Valid while a child is selected (either state).
    pub fn link_guardian(
        &mut self,
        guardian_id: &str,
        relationship: Option<String>,
    ) -> DomainResult<()> {
        let child = self.selected_child()?.clone();
        self.guardian_service.link_to_child(LinkGuardianCommand {
            child_id: child.id.clone(),
            guardian_id: guardian_id.to_string(),
            relationship,
        })?;
        self.select_child(child)
    }

    /// Create a brand-new guardian and link them in one step, for the
    /// adult who is not in the directory yet. A duplicate surfaces as
    /// [`DomainError::DuplicateGuardian`] and leaves the session state
    /// untouched.
    pub fn create_and_link_guardian(
        &mut self,
        command: CreateGuardianCommand,
        relationship: Option<String>,
    ) -> DomainResult<Guardian> {
        let child = self.selected_child()?.clone();
        let guardian = self.guardian_service.create_guardian(command)?.guardian;
        self.guardian_service.link_to_child(LinkGuardianCommand {
            child_id: child.id.clone(),
            guardian_id: guardian.id.clone(),
            relationship,
        })?;
        self.select_child(child)?;
        Ok(guardian)
    }

    /// `ChildSelected -> CheckedIn`: complete the check-in with the
    /// chosen guardian. Refused from `GuardianPending` (zero linked
    /// guardians) and on any engine error the state is unchanged.
    pub fn confirm_check_in(&mut self, guardian_id: &str) -> DomainResult<CheckInResult> {
        let child = match &self.state {
            SessionState::ChildSelected { child, .. } => child.clone(),
            SessionState::GuardianPending { child } => {
                return Err(DomainError::Validation(format!(
                    "{} has no authorized guardian linked yet",
                    child.full_name()
                )));
            }
            _ => {
                return Err(DomainError::Validation(
                    "No child selected for check-in".to_string(),
                ));
            }
        };

        let result = self.attendance_service.check_in(CheckInCommand {
            child_id: child.id.clone(),
            guardian_id: guardian_id.to_string(),
            service_date: self.service_date,
        })?;

        info!(
            "Session checked in child {} on {}",
            child.id, self.service_date
        );
        self.state = SessionState::CheckedIn {
            record: result.record.clone(),
        };
        Ok(result)
    }

    /// `CheckedIn -> CheckedOut` (or straight from a roster row):
    /// close an open record with an authorized guardian. Double
    /// checkout is a no-op success at the engine level.
    pub fn check_out(
        &mut self,
        attendance_id: &str,
        guardian_id: &str,
    ) -> DomainResult<CheckOutResult> {
        let result = self.attendance_service.check_out(CheckOutCommand {
            attendance_id: attendance_id.to_string(),
            service_date: self.service_date,
            guardian_id: guardian_id.to_string(),
        })?;
        self.state = SessionState::CheckedOut {
            record: result.record.clone(),
        };
        Ok(result)
    }

    /// Any state `-> Idle`: always permitted; clears selection, search
    /// results, and orphans in-flight loads.
    pub fn cancel(&mut self) {
        self.load_generation += 1;
        self.child_search.reset();
        self.guardian_search.reset();
        self.state = SessionState::Idle;
    }

    /// Acknowledge a completed check-in/checkout and return to `Idle`
    /// for the next family.
    pub fn acknowledge(&mut self) {
        match self.state {
            SessionState::CheckedIn { .. } | SessionState::CheckedOut { .. } => self.cancel(),
            _ => {}
        }
    }

    fn selected_child(&self) -> DomainResult<&Child> {
        match &self.state {
            SessionState::ChildSelected { child, .. }
            | SessionState::GuardianPending { child } => Ok(child),
            _ => Err(DomainError::Validation(
                "No child selected".to_string(),
            )),
        }
    }
}
