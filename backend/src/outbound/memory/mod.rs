//! In-process adapters for the document store, identity service and
//! profile collection.
//!
//! State lives for the life of the process. These adapters back the server
//! binary and the integration tests alike.

mod identity_provider;
mod listing_repository;
mod user_profile_repository;

pub use identity_provider::MemoryIdentityProvider;
pub use listing_repository::MemoryListingRepository;
pub use user_profile_repository::MemoryUserProfileRepository;
