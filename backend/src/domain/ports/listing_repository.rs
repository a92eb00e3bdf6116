//! Driven port for the listing document store.
//!
//! The store owns identifier and timestamp assignment and publishes a
//! revision counter that ticks on every successful write, which live
//! subscriptions use to know when to re-query.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{Listing, ListingId, ListingScope, NewListing};

use super::define_port_error;

define_port_error! {
    /// Errors raised by listing store adapters.
    pub enum ListingRepositoryError {
        /// The store could not be reached.
        Connection { message: String } => "{message}",
        /// A read or write was rejected by the store.
        Query { message: String } => "{message}",
    }
}

impl ListingRepositoryError {
    /// Message reported by the backing store.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection { message } | Self::Query { message } => message,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Write one listing, assigning its id and creation time.
    async fn create(&self, listing: &NewListing) -> Result<Listing, ListingRepositoryError>;

    /// Remove a listing. Returns `false` when nothing had that id.
    async fn delete(&self, id: &ListingId) -> Result<bool, ListingRepositoryError>;

    async fn find_by_id(&self, id: &ListingId) -> Result<Option<Listing>, ListingRepositoryError>;

    /// Listings visible in `scope`, in that scope's order.
    async fn query(&self, scope: &ListingScope) -> Result<Vec<Listing>, ListingRepositoryError>;

    /// Revision counter bumped after every write.
    fn changes(&self) -> watch::Receiver<u64>;
}
