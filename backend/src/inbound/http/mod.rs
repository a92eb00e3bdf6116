//! HTTP inbound adapter: page views, REST actions, media and health probes.

pub mod cache_control;
pub mod error;
pub mod health;
pub mod listings;
pub mod media;
pub mod pages;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;
