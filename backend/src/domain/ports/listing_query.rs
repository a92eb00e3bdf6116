//! Driving port for reading listings, once or as a live feed.

use async_trait::async_trait;

use crate::domain::{Error, Listing, ListingId, ListingScope, ListingSubscription, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingQuery: Send + Sync {
    /// Current listings in `scope`.
    async fn snapshot(&self, scope: &ListingScope) -> Result<Vec<Listing>, Error>;

    async fn find(&self, id: &ListingId) -> Result<Option<Listing>, Error>;

    /// Open a live feed over `scope`. Dropping it releases the feed.
    fn subscribe(&self, scope: ListingScope) -> ListingSubscription;

    /// Every listing, newest first.
    async fn latest(&self) -> Result<Vec<Listing>, Error> {
        self.snapshot(&ListingScope::Latest).await
    }

    /// Listings posted by `owner`, in store order.
    async fn owned_by(&self, owner: &UserId) -> Result<Vec<Listing>, Error> {
        self.snapshot(&ListingScope::OwnedBy(owner.clone())).await
    }

    /// Unfiltered collection, in store order.
    async fn everything(&self) -> Result<Vec<Listing>, Error> {
        self.snapshot(&ListingScope::Everything).await
    }
}
