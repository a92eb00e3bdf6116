//! Driven port for the public user profile collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DisplayName, EmailAddress, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user profile adapters.
    pub enum UserProfileRepositoryError {
        Connection { message: String } => "{message}",
        Query { message: String } => "{message}",
    }
}

/// Profile document written once at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: DisplayName,
    pub email: EmailAddress,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    async fn upsert(&self, profile: &UserProfile) -> Result<(), UserProfileRepositoryError>;

    async fn find(&self, id: &UserId) -> Result<Option<UserProfile>, UserProfileRepositoryError>;
}
