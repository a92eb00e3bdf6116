//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`*Command`, `*Query`) are what inbound adapters call.
//! Driven ports (`*Repository`, `*Store`, `*Provider`) are what outbound
//! adapters implement. Driven port errors are generated by
//! `define_port_error!` and mapped to [`crate::domain::Error`] by services.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod blob_store;
mod identity_provider;
mod listing_command;
mod listing_query;
mod listing_repository;
mod user_profile_repository;

#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use account_command::AccountCommand;
pub use blob_store::{BlobStore, BlobStoreError, StoredBlob};
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{IdentityProvider, IdentityProviderError};
pub use listing_command::ListingCommand;
#[cfg(test)]
pub use listing_query::MockListingQuery;
pub use listing_query::ListingQuery;
#[cfg(test)]
pub use listing_repository::MockListingRepository;
pub use listing_repository::{ListingRepository, ListingRepositoryError};
#[cfg(test)]
pub use user_profile_repository::MockUserProfileRepository;
pub use user_profile_repository::{UserProfile, UserProfileRepository, UserProfileRepositoryError};
