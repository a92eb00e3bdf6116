//! In-process email/password `IdentityProvider`.
//!
//! Passwords are never held: each account keeps an Argon2 PHC string, and
//! hashing and verification run on the blocking pool. Unknown addresses
//! and wrong passwords produce the same error.

use std::collections::HashMap;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use async_trait::async_trait;
use rand::RngCore;
use tokio::sync::RwLock;
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::{IdentityProvider, IdentityProviderError};
use crate::domain::{DisplayName, EmailAddress, FALLBACK_OWNER_NAME, LoginCredentials, User, UserId};

struct Account {
    user: User,
    password_hash: String,
}

fn hash_password(password: &str) -> Result<String, IdentityProviderError> {
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt)
        .map_err(|err| IdentityProviderError::unavailable(err.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| IdentityProviderError::unavailable(err.to_string()))
}

fn password_matches(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Run an Argon2 computation off the async workers.
async fn off_loop<T, F>(work: F) -> Result<T, IdentityProviderError>
where
    F: FnOnce() -> Result<T, IdentityProviderError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| IdentityProviderError::unavailable(err.to_string()))?
}

/// Initial display name: the email's local part, as hosted providers do.
fn default_display_name(email: &EmailAddress) -> Result<DisplayName, IdentityProviderError> {
    let local = email.as_ref().split('@').next().unwrap_or_default();
    DisplayName::new(local)
        .or_else(|_| DisplayName::new(FALLBACK_OWNER_NAME))
        .map_err(|err| IdentityProviderError::unavailable(err.to_string()))
}

/// Accounts keyed by normalised email address.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    accounts: RwLock<HashMap<EmailAddress, Account>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_up(&self, credentials: &LoginCredentials) -> Result<User, IdentityProviderError> {
        if self.accounts.read().await.contains_key(credentials.email()) {
            return Err(IdentityProviderError::email_in_use());
        }
        let password = Zeroizing::new(credentials.password().to_owned());
        let password_hash = off_loop(move || hash_password(&password)).await?;

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(credentials.email()) {
            return Err(IdentityProviderError::email_in_use());
        }
        let user = User::new(
            UserId::random(),
            default_display_name(credentials.email())?,
            credentials.email().clone(),
        );
        accounts.insert(
            credentials.email().clone(),
            Account {
                user: user.clone(),
                password_hash,
            },
        );
        debug!(user_id = %user.id(), "identity created");
        Ok(user)
    }

    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<User, IdentityProviderError> {
        let Some((user, stored)) = self
            .accounts
            .read()
            .await
            .get(credentials.email())
            .map(|account| (account.user.clone(), account.password_hash.clone()))
        else {
            return Err(IdentityProviderError::invalid_credentials());
        };
        let password = Zeroizing::new(credentials.password().to_owned());
        if off_loop(move || Ok(password_matches(&password, &stored))).await? {
            Ok(user)
        } else {
            Err(IdentityProviderError::invalid_credentials())
        }
    }

    async fn update_display_name(
        &self,
        id: &UserId,
        display_name: &DisplayName,
    ) -> Result<User, IdentityProviderError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .values_mut()
            .find(|account| account.user.id() == id)
            .ok_or_else(|| IdentityProviderError::unknown_user(id.to_string()))?;
        account.user = User::new(
            id.clone(),
            display_name.clone(),
            account.user.email().clone(),
        );
        Ok(account.user.clone())
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, IdentityProviderError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|account| account.user.id() == id)
            .map(|account| account.user.clone()))
    }
}
