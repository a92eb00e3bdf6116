//! Live listing feeds.
//!
//! A view holds one [`ListingSubscription`] for as long as it is displayed.
//! The subscription owns a slot in a [`SubscriptionRegistry`]; the slot is
//! released in `Drop`, so every exit path (normal close, error, panic
//! unwinding) gives it back.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;
use tracing::debug;

use super::listing_service::map_listing_store_error;
use super::ports::ListingRepository;
use super::{Error, Listing, ListingId, UserId};

/// Which slice of the collection a view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingScope {
    /// Everything, newest first.
    Latest,
    /// One owner's listings, in store order.
    OwnedBy(UserId),
    /// Unfiltered collection, in store order.
    Everything,
    /// One listing by id; empty once deleted.
    Single(ListingId),
}

impl ListingScope {
    /// Whether `listing` belongs to this scope, ignoring order.
    pub fn includes(&self, listing: &Listing) -> bool {
        match self {
            Self::Latest | Self::Everything => true,
            Self::OwnedBy(owner) => listing.owner() == owner,
            Self::Single(id) => listing.id() == *id,
        }
    }
}

/// Counts open subscriptions.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    active: Arc<AtomicUsize>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subscriptions currently held.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    fn acquire(&self) -> SubscriptionSlot {
        let now = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(active = now, "listing subscription opened");
        SubscriptionSlot {
            active: Arc::clone(&self.active),
        }
    }
}

struct SubscriptionSlot {
    active: Arc<AtomicUsize>,
}

impl Drop for SubscriptionSlot {
    fn drop(&mut self) {
        let previous = self.active.fetch_sub(1, Ordering::AcqRel);
        debug!(
            active = previous.saturating_sub(1),
            "listing subscription released"
        );
    }
}

/// Stream of snapshots for one scope.
///
/// The first [`next`](Self::next) returns the current snapshot straight
/// away; each later call waits for the store to change and re-queries.
pub struct ListingSubscription {
    scope: ListingScope,
    repository: Arc<dyn ListingRepository>,
    changes: watch::Receiver<u64>,
    primed: bool,
    _slot: SubscriptionSlot,
}

impl ListingSubscription {
    /// Open a subscription, taking a slot from `registry`.
    pub fn open(
        scope: ListingScope,
        repository: Arc<dyn ListingRepository>,
        registry: &SubscriptionRegistry,
    ) -> Self {
        let changes = repository.changes();
        Self {
            scope,
            repository,
            changes,
            primed: false,
            _slot: registry.acquire(),
        }
    }

    pub fn scope(&self) -> &ListingScope {
        &self.scope
    }

    /// Next snapshot of the scope.
    ///
    /// # Errors
    /// Returns [`crate::domain::ErrorCode::ServiceUnavailable`] when the store
    /// fails or stops publishing changes.
    pub async fn next(&mut self) -> Result<Vec<Listing>, Error> {
        if self.primed {
            self.changes
                .changed()
                .await
                .map_err(|_| Error::service_unavailable("listing feed closed"))?;
        } else {
            self.changes.borrow_and_update();
            self.primed = true;
        }
        self.repository
            .query(&self.scope)
            .await
            .map_err(map_listing_store_error)
    }
}

impl fmt::Debug for ListingSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingSubscription")
            .field("scope", &self.scope)
            .field("primed", &self.primed)
            .finish_non_exhaustive()
    }
}
