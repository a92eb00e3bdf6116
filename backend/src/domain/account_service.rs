//! Account registration, sign-in and session resolution.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{error, info, warn};

use crate::domain::ports::{
    AccountCommand, IdentityProvider, IdentityProviderError, UserProfile, UserProfileRepository,
    UserProfileRepositoryError,
};
use crate::domain::{Error, LoginCredentials, Registration, User, UserId};

/// Account service implementing [`AccountCommand`].
#[derive(Clone)]
pub struct AccountService<I, P> {
    identities: Arc<I>,
    profiles: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<I, P> AccountService<I, P> {
    pub fn new(identities: Arc<I>, profiles: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            identities,
            profiles,
            clock,
        }
    }
}

fn map_identity_error(err: IdentityProviderError) -> Error {
    match err {
        IdentityProviderError::EmailInUse => {
            Error::invalid_request(err.to_string()).with_details(json!({ "field": "email" }))
        }
        IdentityProviderError::InvalidCredentials => Error::unauthorized(err.to_string()),
        IdentityProviderError::UnknownUser { .. } => Error::not_found(err.to_string()),
        IdentityProviderError::Unavailable { message } => {
            error!(error = %message, "identity provider unavailable");
            Error::service_unavailable(message)
        }
    }
}

fn map_profile_error(err: UserProfileRepositoryError) -> Error {
    error!(error = %err, "user profile write failed");
    match err {
        UserProfileRepositoryError::Connection { message }
        | UserProfileRepositoryError::Query { message } => Error::service_unavailable(message),
    }
}

#[async_trait]
impl<I, P> AccountCommand for AccountService<I, P>
where
    I: IdentityProvider,
    P: UserProfileRepository,
{
    async fn register(&self, registration: &Registration) -> Result<User, Error> {
        let created = self
            .identities
            .sign_up(registration.credentials())
            .await
            .map_err(map_identity_error)?;
        let user = match registration.display_name() {
            Some(name) => self
                .identities
                .update_display_name(created.id(), name)
                .await
                .map_err(map_identity_error)?,
            None => created,
        };
        let profile = UserProfile {
            id: user.id().clone(),
            name: user.display_name().clone(),
            email: user.email().clone(),
            created_at: self.clock.utc(),
        };
        self.profiles
            .upsert(&profile)
            .await
            .map_err(map_profile_error)?;
        info!(user_id = %user.id(), "account registered");
        Ok(user)
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let user = self
            .identities
            .sign_in(credentials)
            .await
            .map_err(|err| {
                if matches!(err, IdentityProviderError::InvalidCredentials) {
                    warn!("sign-in rejected");
                }
                map_identity_error(err)
            })?;
        info!(user_id = %user.id(), "signed in");
        Ok(user)
    }

    async fn resolve(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.identities
            .find_user(id)
            .await
            .map_err(map_identity_error)
    }
}
