//! Domain primitives, services and ports.
//!
//! Purpose: define the marketplace's strongly typed entities and the use
//! cases that operate on them, independent of HTTP and of any particular
//! storage backend. Inbound adapters call the driving ports in [`ports`];
//! outbound adapters implement the driven ones.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - User (alias to `user::User`): signed-in account.
//! - Listing (alias to `listing::Listing`): for-sale item record.
//! - ListingFilter (alias to `listing_filter::ListingFilter`): visible
//!   subset derivation.
//! - ListingService / AccountService: driving port implementations.

pub mod account_service;
pub mod auth;
pub mod error;
pub mod image_source;
pub mod listing;
pub mod listing_filter;
pub mod listing_service;
pub mod live;
pub mod ports;
pub mod session_gate;
pub mod trace_id;
pub mod upload;
pub mod user;

pub use self::account_service::AccountService;
pub use self::auth::{
    CredentialsValidationError, LoginCredentials, PASSWORD_MIN_LEN, Registration,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::image_source::{
    ImageSelection, ImageSelectionError, ImageSource, ImageTab, ImageUpload, ImageUrl,
};
pub use self::listing::{
    CURRENCY, Category, FALLBACK_OWNER_NAME, ImageRef, Listing, ListingDraft, ListingForm,
    ListingId, ListingValidationError, NewListing, PLACEHOLDER_IMAGE, Price,
};
pub use self::listing_filter::{CategoryFilter, ListingFilter, PriceBound, PriceRange};
pub use self::listing_service::{LOGIN_TO_POST, ListingService, PreparedListing};
pub use self::live::{ListingScope, ListingSubscription, SubscriptionRegistry};
pub use self::session_gate::{Access, AdminIdentity, SessionState, require_admin, require_member};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::upload::{
    BlobPath, IgnoreProgress, LISTING_IMAGE_PREFIX, MonotonicProgress, UploadObserver,
    UploadProgress,
};
pub use self::user::{DISPLAY_NAME_MAX, DisplayName, EmailAddress, User, UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use marketplace::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
