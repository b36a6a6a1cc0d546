/// Access policy
///
/// Every resource operation is described as an [`Action`] and checked against the
/// caller's verified [`Claims`] before any store access. Denials surface as
/// `HelpdeskError::Authorization` (HTTP 403), which is distinct from the 401 produced
/// when a request carries no valid token at all.
mod roles;

pub use roles::Role;

use crate::{auth::Claims, error::HelpdeskError};

/// An operation a caller wants to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ListAccounts,
    ReadAccount { account_id: i64 },
    UpdateAccount { account_id: i64 },
    DeleteAccount,
    CreateAccount,
    ListPlans,
    ReadPlan,
    CreatePlan,
    UpdatePlan,
    DeletePlan,
    CreateTicket,
    ListOwnTickets,
    ListAllTickets,
    ListAssignedTickets,
    UpdateTicket,
    AddNote,
    ListNotes,
}

/// Outcome of a policy evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Action {
    fn denial_message(&self) -> &'static str {
        match self {
            Action::CreateAccount => "Only admins can create users",
            Action::ReadPlan => "Only admins can view plan details",
            Action::CreatePlan => "Only admins can create plans",
            Action::UpdatePlan => "Only admins can update plans",
            Action::DeletePlan => "Only admins can delete plans",
            Action::UpdateTicket => "Only admins can update support requests",
            Action::ListAssignedTickets | Action::AddNote => "Only technicians allowed",
            _ => "Access denied",
        }
    }
}

/// Decide whether `claims` may perform `action`
pub fn evaluate(claims: &Claims, action: Action) -> Decision {
    let allowed = match action {
        Action::ListAccounts
        | Action::DeleteAccount
        | Action::CreateAccount
        | Action::ReadPlan
        | Action::CreatePlan
        | Action::UpdatePlan
        | Action::DeletePlan
        | Action::ListAllTickets
        | Action::UpdateTicket => claims.role == Role::Admin,

        Action::ReadAccount { account_id } | Action::UpdateAccount { account_id } => {
            claims.role == Role::Admin || claims.user_id == account_id
        }

        Action::ListAssignedTickets | Action::AddNote => claims.role == Role::Tech,

        // Self-scoped or public to any authenticated caller
        Action::ListPlans | Action::CreateTicket | Action::ListOwnTickets | Action::ListNotes => {
            true
        }
    };

    if allowed {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// Evaluate and convert a denial into `HelpdeskError::Authorization`
pub fn authorize(claims: &Claims, action: Action) -> Result<(), HelpdeskError> {
    match evaluate(claims, action) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            tracing::warn!(
                "Policy denied {:?} for user {} (role {})",
                action,
                claims.user_id,
                claims.role
            );
            Err(HelpdeskError::Authorization(
                action.denial_message().to_string(),
            ))
        }
    }
}
