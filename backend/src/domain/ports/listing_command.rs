//! Driving port for listing mutations.
//!
//! Listings are only ever created and deleted; there is no edit path.

use async_trait::async_trait;

use crate::domain::{
    Error, ImageSelection, Listing, ListingForm, ListingId, PreparedListing, SessionState, User,
    UploadObserver,
};

#[async_trait]
pub trait ListingCommand: Send + Sync {
    /// Store the image (if uploaded) and write exactly one listing.
    ///
    /// Progress is forwarded to `observer` as non-decreasing percentages.
    /// Nothing is left behind when any step fails.
    async fn publish(
        &self,
        listing: PreparedListing,
        observer: &dyn UploadObserver,
    ) -> Result<Listing, Error>;

    /// Delete one listing on behalf of its owner or the administrator.
    async fn delete(&self, actor: &User, id: &ListingId) -> Result<(), Error>;

    /// Validate the form and publish it in one step.
    async fn submit(
        &self,
        session: &SessionState,
        form: &ListingForm,
        selection: ImageSelection,
        observer: &dyn UploadObserver,
    ) -> Result<Listing, Error> {
        let prepared = PreparedListing::prepare(session, form, selection)?;
        self.publish(prepared, observer).await
    }
}
