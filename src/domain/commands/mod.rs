//! Command and result structs consumed by the domain services. Each
//! operation takes one command and returns one result, keeping the
//! service signatures uniform across the crate.

pub mod attendance;
pub mod child;
pub mod guardian;
