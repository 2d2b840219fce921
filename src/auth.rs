//! Authenticated-caller seam.
//!
//! Session and identity verification live outside this crate; the core
//! only asks "is there a valid caller right now" when a desk session is
//! opened, and hands back [`crate::domain::errors::DomainError::NotAuthenticated`]
//! so the shell can route to its login flow.

/// Opaque identity of the operator running the desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: String,
    pub display_name: String,
}

/// External collaborator answering whether a valid caller is present.
pub trait AuthCheck: Send + Sync {
    fn current_caller(&self) -> Option<CallerIdentity>;
}

/// Fixed-identity check for deployments where the shell has already
/// authenticated the operator out of band.
pub struct StaticAuth {
    caller: Option<CallerIdentity>,
}

impl StaticAuth {
    pub fn signed_in(user_id: &str, display_name: &str) -> Self {
        Self {
            caller: Some(CallerIdentity {
                user_id: user_id.to_string(),
                display_name: display_name.to_string(),
            }),
        }
    }

    pub fn signed_out() -> Self {
        Self { caller: None }
    }
}

impl AuthCheck for StaticAuth {
    fn current_caller(&self) -> Option<CallerIdentity> {
        self.caller.clone()
    }
}
