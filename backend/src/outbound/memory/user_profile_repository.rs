//! In-process `UserProfileRepository` implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::UserId;
use crate::domain::ports::{UserProfile, UserProfileRepository, UserProfileRepositoryError};

/// Profile documents keyed by user id.
#[derive(Default)]
pub struct MemoryUserProfileRepository {
    profiles: RwLock<HashMap<UserId, UserProfile>>,
}

impl MemoryUserProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserProfileRepository for MemoryUserProfileRepository {
    async fn upsert(&self, profile: &UserProfile) -> Result<(), UserProfileRepositoryError> {
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn find(&self, id: &UserId) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        Ok(self.profiles.read().await.get(id).cloned())
    }
}
