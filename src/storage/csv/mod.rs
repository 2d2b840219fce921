//! # CSV Storage Module
//!
//! File-backed implementation of the storage traits. Each entity lives in
//! one CSV table under the data directory, attendance is partitioned into
//! one file per service date, and event settings sit beside them as YAML:
//!
//! ```text
//! <data dir>/
//!   children.csv
//!   guardians.csv
//!   child_guardians.csv
//!   settings.yaml
//!   attendance/
//!     2025-06-08.csv
//!     2025-06-15.csv
//! ```
//!
//! All writes rewrite the affected table through a temp file and rename,
//! so readers never observe a half-written file.

pub mod attendance_repository;
pub mod child_repository;
pub mod connection;
pub mod guardian_repository;
pub mod link_repository;
pub mod settings_repository;

pub use attendance_repository::AttendanceRepository;
pub use child_repository::ChildRepository;
pub use connection::CsvConnection;
pub use guardian_repository::GuardianRepository;
pub use link_repository::LinkRepository;
pub use settings_repository::{EventSettings, SettingsRepository};
