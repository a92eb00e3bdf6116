//! Access decisions for member-only and admin-only views.
//!
//! Views never decide before the session has resolved: a resolving session
//! yields [`Access::Loading`] rather than a redirect, so a signed-in user is
//! not bounced to the login page while their session is still loading.

use super::{User, UserId};

/// What is known about the caller's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The identity behind the session has not been confirmed yet.
    Resolving,
    Anonymous,
    Authenticated(User),
}

impl SessionState {
    /// Signed-in user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Resolving | Self::Anonymous => None,
        }
    }

    pub fn is_resolving(&self) -> bool {
        matches!(self, Self::Resolving)
    }
}

/// Configured administrator, if one is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminIdentity(Option<UserId>);

impl AdminIdentity {
    pub fn new(admin: Option<UserId>) -> Self {
        Self(admin)
    }

    /// Whether `user` is the configured administrator.
    pub fn is_admin(&self, user: &UserId) -> bool {
        self.0.as_ref() == Some(user)
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.0.as_ref()
    }
}

/// Outcome of gating a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Loading,
    LoginRequired,
    AccessDenied,
    Granted(User),
}

/// Gate for views any signed-in user may see.
pub fn require_member(state: &SessionState) -> Access {
    match state {
        SessionState::Resolving => Access::Loading,
        SessionState::Anonymous => Access::LoginRequired,
        SessionState::Authenticated(user) => Access::Granted(user.clone()),
    }
}

/// Gate for the administrator view.
pub fn require_admin(state: &SessionState, admin: &AdminIdentity) -> Access {
    match require_member(state) {
        Access::Granted(user) if admin.is_admin(user.id()) => Access::Granted(user),
        Access::Granted(_) => Access::AccessDenied,
        other => other,
    }
}
