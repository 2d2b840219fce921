//! Domain layer: services, the session state machine, and the pure
//! classification/navigation helpers they consult.

pub mod age_bucket;
pub mod attendance_service;
pub mod child_service;
pub mod commands;
pub mod errors;
pub mod guardian_service;
pub mod models;
pub mod search_coordinator;
pub mod service_date;
pub mod session;

pub use attendance_service::AttendanceService;
pub use child_service::ChildService;
pub use errors::{DomainError, DomainResult};
pub use guardian_service::GuardianService;
pub use search_coordinator::SearchCoordinator;
pub use service_date::ServiceDateNavigator;
pub use session::{CheckInSession, SessionState};
