//! Driving port for account registration, sign-in and session lookup.
//!
//! Sign-out has no port: it only discards the session cookie.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, Registration, User, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an account, name it and record its profile.
    async fn register(&self, registration: &Registration) -> Result<User, Error>;

    async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error>;

    /// Current user behind a session id, or `None` when the account is gone.
    async fn resolve(&self, id: &UserId) -> Result<Option<User>, Error>;
}
