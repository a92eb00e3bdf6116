//! Listing creation, deletion and reads.
//!
//! Creation is split in two: [`PreparedListing::prepare`] validates the
//! session and form without touching any port, then
//! [`ListingCommand::publish`] stores the image and writes the record. An
//! inbound adapter can therefore reject a bad submission before it starts
//! streaming progress back to the client.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{error, info, warn};

use crate::domain::ports::{
    BlobStore, BlobStoreError, ListingCommand, ListingQuery, ListingRepository,
    ListingRepositoryError,
};
use crate::domain::{
    AdminIdentity, BlobPath, Error, ImageRef, ImageSelection, ImageSource, ImageUpload, Listing,
    ListingDraft, ListingForm, ListingId, ListingScope, ListingSubscription, MonotonicProgress,
    NewListing, SessionState, SubscriptionRegistry, UploadObserver, User,
};

/// Message shown when an anonymous visitor submits the form.
pub const LOGIN_TO_POST: &str = "Please login to post";

pub(crate) fn map_listing_store_error(err: ListingRepositoryError) -> Error {
    error!(error = %err, "listing store operation failed");
    Error::service_unavailable(err.message())
}

fn map_blob_error(err: BlobStoreError) -> Error {
    error!(error = %err, "blob store operation failed");
    match err {
        BlobStoreError::NotFound { .. } => Error::not_found(err.to_string()),
        BlobStoreError::Transfer { message } | BlobStoreError::Url { message } => {
            Error::service_unavailable(message)
        }
    }
}

/// Submission that passed every check that needs no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedListing {
    draft: ListingDraft,
    image: ImageSource,
    owner: User,
}

impl PreparedListing {
    /// Check the session, the text fields and the image selection.
    ///
    /// # Errors
    /// - [`crate::domain::ErrorCode::ServiceUnavailable`] while the session
    ///   is still resolving.
    /// - [`crate::domain::ErrorCode::Unauthorized`] for anonymous sessions.
    /// - [`crate::domain::ErrorCode::InvalidRequest`] for bad form input,
    ///   with the offending field in `details.field`.
    pub fn prepare(
        session: &SessionState,
        form: &ListingForm,
        selection: ImageSelection,
    ) -> Result<Self, Error> {
        let owner = match session {
            SessionState::Resolving => {
                return Err(Error::service_unavailable("session is still loading"));
            }
            SessionState::Anonymous => return Err(Error::unauthorized(LOGIN_TO_POST)),
            SessionState::Authenticated(user) => user.clone(),
        };
        let draft = ListingDraft::from_form(form).map_err(|err| {
            Error::invalid_request(err.to_string()).with_details(json!({ "field": err.field() }))
        })?;
        let image = selection.resolve().map_err(|err| {
            Error::invalid_request(err.to_string()).with_details(json!({ "field": "image" }))
        })?;
        Ok(Self {
            draft,
            image,
            owner,
        })
    }

    pub fn owner(&self) -> &User {
        &self.owner
    }

    pub fn image(&self) -> &ImageSource {
        &self.image
    }

    /// Bytes that will be transferred; zero for URL images.
    pub fn upload_len(&self) -> usize {
        match &self.image {
            ImageSource::Upload(upload) => upload.len(),
            ImageSource::Url(_) => 0,
        }
    }
}

/// Listing service implementing the listing driving ports.
#[derive(Clone)]
pub struct ListingService<R, B> {
    listings: Arc<R>,
    blobs: Arc<B>,
    clock: Arc<dyn Clock>,
    admin: AdminIdentity,
    registry: SubscriptionRegistry,
}

impl<R, B> ListingService<R, B> {
    /// Create a service over the given store adapters.
    pub fn new(listings: Arc<R>, blobs: Arc<B>, clock: Arc<dyn Clock>, admin: AdminIdentity) -> Self {
        Self {
            listings,
            blobs,
            clock,
            admin,
            registry: SubscriptionRegistry::new(),
        }
    }

    /// Open live feeds, for logging and tests.
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }
}

impl<R, B> ListingService<R, B>
where
    R: ListingRepository,
    B: BlobStore,
{
    async fn discard_blob(&self, path: &BlobPath) {
        if let Err(err) = self.blobs.remove(path).await {
            warn!(error = %err, path = %path, "could not remove orphaned upload");
        }
    }

    async fn store_upload(
        &self,
        owner: &User,
        upload: &ImageUpload,
        progress: &MonotonicProgress<'_>,
    ) -> Result<(ImageRef, BlobPath), Error> {
        let path = BlobPath::for_listing_image(owner.id(), self.clock.utc(), upload.file_name());
        progress.start();
        if let Err(err) = self.blobs.upload(&path, upload, progress).await {
            self.discard_blob(&path).await;
            return Err(map_blob_error(err));
        }
        progress.finish();
        match self.blobs.public_url(&path).await {
            Ok(url) => Ok((ImageRef::from_url(&url), path)),
            Err(err) => {
                self.discard_blob(&path).await;
                Err(map_blob_error(err))
            }
        }
    }
}

#[async_trait]
impl<R, B> ListingCommand for ListingService<R, B>
where
    R: ListingRepository,
    B: BlobStore,
{
    async fn publish(
        &self,
        listing: PreparedListing,
        observer: &dyn UploadObserver,
    ) -> Result<Listing, Error> {
        let PreparedListing {
            draft,
            image,
            owner,
        } = listing;
        let progress = MonotonicProgress::new(observer);
        let (image, stored) = match image {
            ImageSource::Url(url) => (ImageRef::from_url(url.as_url()), None),
            ImageSource::Upload(upload) => {
                let (image, path) = self.store_upload(&owner, &upload, &progress).await?;
                (image, Some(path))
            }
        };

        let new = NewListing::new(draft, image, &owner);
        match self.listings.create(&new).await {
            Ok(created) => {
                info!(listing_id = %created.id(), owner = %owner.id(), "listing created");
                Ok(created)
            }
            Err(err) => {
                if let Some(path) = stored {
                    self.discard_blob(&path).await;
                }
                Err(map_listing_store_error(err))
            }
        }
    }

    async fn delete(&self, actor: &User, id: &ListingId) -> Result<(), Error> {
        let missing = || Error::not_found(format!("listing {id} does not exist"));
        let listing = self
            .listings
            .find_by_id(id)
            .await
            .map_err(map_listing_store_error)?
            .ok_or_else(missing)?;
        if listing.owner() != actor.id() && !self.admin.is_admin(actor.id()) {
            return Err(Error::forbidden(
                "only the owner or the administrator may delete this listing",
            ));
        }
        if !self
            .listings
            .delete(id)
            .await
            .map_err(map_listing_store_error)?
        {
            return Err(missing());
        }
        info!(listing_id = %id, actor = %actor.id(), "listing deleted");
        Ok(())
    }
}

#[async_trait]
impl<R, B> ListingQuery for ListingService<R, B>
where
    R: ListingRepository + 'static,
    B: BlobStore,
{
    async fn snapshot(&self, scope: &ListingScope) -> Result<Vec<Listing>, Error> {
        self.listings
            .query(scope)
            .await
            .map_err(map_listing_store_error)
    }

    async fn find(&self, id: &ListingId) -> Result<Option<Listing>, Error> {
        self.listings
            .find_by_id(id)
            .await
            .map_err(map_listing_store_error)
    }

    fn subscribe(&self, scope: ListingScope) -> ListingSubscription {
        let repository: Arc<dyn ListingRepository> = self.listings.clone();
        ListingSubscription::open(scope, repository, &self.registry)
    }
}

#[cfg(test)]
#[path = "listing_service_tests.rs"]
mod tests;
