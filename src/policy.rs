//! Authorization decisions.
//!
//! `decide` is a pure function of the caller, the attempted action and the
//! resource owner. It performs no I/O; handlers look the owner up immediately
//! before calling it.

use crate::{error::AppError, models::UserIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreatePost,
    EditPost,
    DeletePost,
    CreateComment,
    EditComment,
    DeleteComment,
    ReadPublic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No identity where one is required. Surfaces as 401.
    Unauthenticated,
    /// An identity without the required role or ownership. Surfaces as 403.
    NotAuthorised,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::Unauthenticated) => Err(AppError::Unauthenticated),
            Decision::Deny(DenyReason::NotAuthorised) => Err(AppError::Unauthorized),
        }
    }
}

/// Decides whether `identity` may perform `action` on a resource owned by
/// `resource_owner` (comment actions only; other actions ignore it).
pub fn decide(
    identity: Option<&UserIdentity>,
    action: Action,
    resource_owner: Option<&str>,
) -> Decision {
    if action == Action::ReadPublic {
        return Decision::Allow;
    }

    let Some(identity) = identity else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };

    let allowed = match action {
        Action::ReadPublic => true,
        Action::CreatePost | Action::EditPost | Action::DeletePost => identity.admin,
        Action::CreateComment => true,
        Action::EditComment | Action::DeleteComment => {
            identity.admin || resource_owner == Some(identity.username.as_str())
        }
    };

    if allowed {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::NotAuthorised)
    }
}
