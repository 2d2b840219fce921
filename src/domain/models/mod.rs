//! Domain models for the check-in system.

pub mod attendance;
pub mod child;
pub mod guardian;
