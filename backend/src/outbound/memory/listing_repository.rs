//! In-process `ListingRepository` implementation.
//!
//! Stands in for the hosted document store: it assigns identifiers and
//! creation times on write, keeps records in insertion order and ticks a
//! revision counter after every change so live feeds can re-query.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::{RwLock, watch};
use tracing::debug;

use crate::domain::ports::{ListingRepository, ListingRepositoryError};
use crate::domain::{Listing, ListingId, ListingScope, NewListing};

/// Listing collection held in memory.
pub struct MemoryListingRepository {
    clock: Arc<dyn Clock>,
    records: RwLock<Vec<Listing>>,
    revision: watch::Sender<u64>,
}

impl MemoryListingRepository {
    /// Create an empty collection stamping records with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            clock,
            records: RwLock::new(Vec::new()),
            revision,
        }
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

#[async_trait]
impl ListingRepository for MemoryListingRepository {
    async fn create(&self, listing: &NewListing) -> Result<Listing, ListingRepositoryError> {
        let record = Listing::from_parts(ListingId::random(), self.clock.utc(), listing.clone());
        self.records.write().await.push(record.clone());
        self.bump();
        debug!(listing_id = %record.id(), "listing stored");
        Ok(record)
    }

    async fn delete(&self, id: &ListingId) -> Result<bool, ListingRepositoryError> {
        let removed = {
            let mut records = self.records.write().await;
            let before = records.len();
            records.retain(|listing| listing.id() != *id);
            records.len() != before
        };
        if removed {
            self.bump();
        }
        Ok(removed)
    }

    async fn find_by_id(&self, id: &ListingId) -> Result<Option<Listing>, ListingRepositoryError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|listing| listing.id() == *id)
            .cloned())
    }

    async fn query(&self, scope: &ListingScope) -> Result<Vec<Listing>, ListingRepositoryError> {
        let records = self.records.read().await;
        let mut selected: Vec<Listing> = match scope {
            // Reverse first so equal timestamps keep newest-written first.
            ListingScope::Latest => records.iter().rev().cloned().collect(),
            _ => records
                .iter()
                .filter(|listing| scope.includes(listing))
                .cloned()
                .collect(),
        };
        if matches!(scope, ListingScope::Latest) {
            selected.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        }
        Ok(selected)
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
