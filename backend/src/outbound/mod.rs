//! Outbound adapters implementing domain ports.
//!
//! - **memory**: in-process document store, identity service and profile
//!   collection
//! - **blobs**: image storage in memory or on local disk
//!
//! Adapters are thin translators between domain types and their backing
//! storage. They contain no business logic.

pub mod blobs;
pub mod memory;
