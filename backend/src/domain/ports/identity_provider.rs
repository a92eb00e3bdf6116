//! Driven port for the hosted email/password identity service.

use async_trait::async_trait;

use crate::domain::{DisplayName, LoginCredentials, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity provider adapters.
    pub enum IdentityProviderError {
        /// Sign-up with an address that already has an account.
        EmailInUse => "email address is already in use",
        /// Unknown address or wrong password; deliberately indistinguishable.
        InvalidCredentials => "invalid email or password",
        /// No identity carries the id.
        UnknownUser { id: String } => "no account exists for {id}",
        /// The provider could not be reached.
        Unavailable { message: String } => "{message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an identity. The display name starts as the email's local part.
    async fn sign_up(&self, credentials: &LoginCredentials) -> Result<User, IdentityProviderError>;

    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<User, IdentityProviderError>;

    /// Replace the display name on an existing identity.
    async fn update_display_name(
        &self,
        id: &UserId,
        display_name: &DisplayName,
    ) -> Result<User, IdentityProviderError>;

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, IdentityProviderError>;
}
