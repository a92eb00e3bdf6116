//! Campus marketplace backend library.
//!
//! The domain lives under [`domain`]; [`inbound`] adapters expose it over
//! HTTP and WebSocket and [`outbound`] adapters back it with storage.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
