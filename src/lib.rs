//! # Check-In Tracker Core
//!
//! Attendance lifecycle engine for a supervised weekly kids check-in
//! desk: child and guardian directories, guardian authorization links,
//! age-bucket classification, check-in/check-out with a per-service-date
//! roster, and cancellation-safe search orchestration.
//!
//! Presentation, navigation, and identity verification are external; the
//! crate exposes synchronous domain services plus a per-workflow
//! [`domain::CheckInSession`] state machine for the interactive flow.

use anyhow::Result;
use chrono::Utc;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

pub mod auth;
pub mod domain;
pub mod storage;

pub use storage::csv::CsvConnection;

use auth::AuthCheck;
use domain::errors::{DomainError, DomainResult};
use domain::{AttendanceService, CheckInSession, ChildService, GuardianService, ServiceDateNavigator};

/// Main backend struct that wires the store handle into all services.
/// Constructed once per process; services share the connection by `Arc`.
pub struct Backend {
    pub child_service: ChildService,
    pub guardian_service: GuardianService,
    pub attendance_service: AttendanceService,
}

impl Backend {
    /// Create a new backend over the given data directory. Failure here
    /// is a configuration problem (unreachable store); callers surface
    /// it as a blocking condition rather than retrying.
    pub fn new(data_directory: PathBuf) -> Result<Self> {
        let csv_conn = Arc::new(CsvConnection::new(data_directory)?);

        let child_service = ChildService::new(csv_conn.clone());
        let guardian_service = GuardianService::new(csv_conn.clone());
        let attendance_service = AttendanceService::new(
            csv_conn,
            child_service.clone(),
            guardian_service.clone(),
        );

        Ok(Backend {
            child_service,
            guardian_service,
            attendance_service,
        })
    }

    /// Open an interactive desk session for the authenticated caller,
    /// pointed at the upcoming service date. Absence of a caller maps
    /// to [`DomainError::NotAuthenticated`] for hand-off to login.
    pub fn open_session(&self, auth: &dyn AuthCheck) -> DomainResult<CheckInSession> {
        let caller = auth.current_caller().ok_or(DomainError::NotAuthenticated)?;
        info!("Opening desk session for {}", caller.display_name);

        let settings = self.attendance_service.event_settings()?;
        let navigator =
            ServiceDateNavigator::new(settings.event_weekday, Utc::now().date_naive());

        Ok(CheckInSession::new(
            self.child_service.clone(),
            self.guardian_service.clone(),
            self.attendance_service.clone(),
            navigator.selected(),
        ))
    }

    /// Navigator seeded from the configured event weekday and today.
    pub fn service_date_navigator(&self) -> DomainResult<ServiceDateNavigator> {
        let settings = self.attendance_service.event_settings()?;
        Ok(ServiceDateNavigator::new(
            settings.event_weekday,
            Utc::now().date_naive(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::StaticAuth;
    use chrono::Datelike;
    use tempfile::TempDir;

    #[test]
    fn test_backend_wires_services_over_one_store() {
        let temp_dir = TempDir::new().unwrap();
        let backend = Backend::new(temp_dir.path().to_path_buf()).unwrap();

        let child = backend
            .child_service
            .create_child(domain::commands::child::CreateChildCommand {
                first_name: "Mia".to_string(),
                last_name: "Torres".to_string(),
                birthdate: "2018-03-14".to_string(),
                allergies: None,
                medical_notes: None,
            })
            .unwrap()
            .child;

        let found = backend
            .child_service
            .get_child(domain::commands::child::GetChildCommand { child_id: child.id })
            .unwrap();
        assert!(found.child.is_some());
    }

    #[test]
    fn test_open_session_requires_caller() {
        let temp_dir = TempDir::new().unwrap();
        let backend = Backend::new(temp_dir.path().to_path_buf()).unwrap();

        let err = backend.open_session(&StaticAuth::signed_out()).unwrap_err();
        assert!(matches!(err, DomainError::NotAuthenticated));

        let session = backend
            .open_session(&StaticAuth::signed_in("user::1", "Desk Lead"))
            .unwrap();
        // Default event weekday is Sunday.
        assert_eq!(session.service_date().weekday(), chrono::Weekday::Sun);
    }
}
