//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::AdminIdentity;
use crate::domain::ports::{AccountCommand, BlobStore, ListingCommand, ListingQuery};

/// Largest image accepted by the add-product form, in bytes.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountCommand>,
    pub listings: Arc<dyn ListingCommand>,
    pub listings_query: Arc<dyn ListingQuery>,
    pub blobs: Arc<dyn BlobStore>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountCommand>,
    pub listings: Arc<dyn ListingCommand>,
    pub listings_query: Arc<dyn ListingQuery>,
    pub blobs: Arc<dyn BlobStore>,
    pub admin: AdminIdentity,
    pub max_upload_bytes: usize,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state with no administrator and the default upload limit.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use marketplace::domain::{AccountService, AdminIdentity, ListingService, UserId};
    /// use marketplace::inbound::http::state::{HttpState, HttpStatePorts};
    /// use marketplace::outbound::blobs::MemoryBlobStore;
    /// use marketplace::outbound::memory::{
    ///     MemoryIdentityProvider, MemoryListingRepository, MemoryUserProfileRepository,
    /// };
    /// use mockable::DefaultClock;
    /// use url::Url;
    ///
    /// let clock = Arc::new(DefaultClock);
    /// let blobs = Arc::new(MemoryBlobStore::new(Url::parse("http://localhost:8080/").unwrap()));
    /// let listings = Arc::new(ListingService::new(
    ///     Arc::new(MemoryListingRepository::new(clock.clone())),
    ///     blobs.clone(),
    ///     clock.clone(),
    ///     AdminIdentity::default(),
    /// ));
    /// let accounts = Arc::new(AccountService::new(
    ///     Arc::new(MemoryIdentityProvider::default()),
    ///     Arc::new(MemoryUserProfileRepository::default()),
    ///     clock,
    /// ));
    /// let state = HttpState::new(HttpStatePorts {
    ///     accounts,
    ///     listings: listings.clone(),
    ///     listings_query: listings,
    ///     blobs,
    /// })
    /// .with_admin(AdminIdentity::new(Some(UserId::random())));
    /// assert!(state.admin.user_id().is_some());
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            accounts,
            listings,
            listings_query,
            blobs,
        } = ports;
        Self {
            accounts,
            listings,
            listings_query,
            blobs,
            admin: AdminIdentity::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Designate the administrator account.
    #[must_use]
    pub fn with_admin(mut self, admin: AdminIdentity) -> Self {
        self.admin = admin;
        self
    }

    /// Override the upload size limit.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    /// JSON body limit large enough for a base64 image at the upload limit.
    pub fn json_body_limit(&self) -> usize {
        // base64 inflates by 4/3; leave room for the text fields.
        self.max_upload_bytes
            .saturating_mul(4)
            .div_ceil(3)
            .saturating_add(64 * 1024)
    }
}
