//! Shared WebSocket adapter state.
//!
//! Feeds depend on the listing and account ports only, so tests can wire
//! them over the in-memory adapters.

use std::sync::Arc;

use url::{Origin, Url};

use crate::domain::AdminIdentity;
use crate::domain::ports::{AccountCommand, ListingQuery};

/// Origins allowed to open a live feed.
#[derive(Debug, Clone)]
pub struct AllowedOrigins(Vec<Origin>);

impl AllowedOrigins {
    /// The public site plus `http://localhost:<port>` for local runs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use marketplace::inbound::ws::state::AllowedOrigins;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://market.example.edu/").unwrap();
    /// let origins = AllowedOrigins::new(&base, 8080);
    /// assert!(origins.is_allowed(&Url::parse("https://market.example.edu").unwrap()));
    /// assert!(origins.is_allowed(&Url::parse("http://localhost:8080").unwrap()));
    /// assert!(!origins.is_allowed(&Url::parse("http://localhost:3000").unwrap()));
    /// ```
    pub fn new(public_base_url: &Url, local_port: u16) -> Self {
        let mut origins = vec![public_base_url.origin()];
        if local_port != 0 {
            if let Ok(local) = Url::parse(&format!("http://localhost:{local_port}")) {
                origins.push(local.origin());
            }
        }
        origins.retain(Origin::is_tuple);
        origins.dedup();
        Self(origins)
    }

    /// Whether a parsed `Origin` header is on the list.
    pub fn is_allowed(&self, origin: &Url) -> bool {
        let origin = origin.origin();
        origin.is_tuple() && self.0.contains(&origin)
    }
}

/// Dependency bundle for the live feed endpoint.
#[derive(Clone)]
pub struct WsState {
    pub listings: Arc<dyn ListingQuery>,
    pub accounts: Arc<dyn AccountCommand>,
    pub admin: AdminIdentity,
    pub origins: AllowedOrigins,
}

impl WsState {
    pub fn new(
        listings: Arc<dyn ListingQuery>,
        accounts: Arc<dyn AccountCommand>,
        admin: AdminIdentity,
        origins: AllowedOrigins,
    ) -> Self {
        Self {
            listings,
            accounts,
            admin,
            origins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://market.example.edu", true)]
    #[case("https://market.example.edu:443", true)]
    #[case("http://market.example.edu", false)]
    #[case("https://evil.example.edu", false)]
    #[case("http://localhost:8080", true)]
    #[case("http://localhost:3000", false)]
    #[case("http://localhost", false)]
    fn evaluates_allow_list(#[case] origin: &str, #[case] expected: bool) {
        let base = Url::parse("https://market.example.edu/").expect("base url");
        let origins = AllowedOrigins::new(&base, 8080);
        let parsed = Url::parse(origin).expect("origin url");
        assert_eq!(origins.is_allowed(&parsed), expected);
    }

    #[rstest]
    fn local_port_zero_adds_nothing() {
        let base = Url::parse("http://localhost:8080/").expect("base url");
        let origins = AllowedOrigins::new(&base, 0);
        assert!(origins.is_allowed(&Url::parse("http://localhost:8080").expect("url")));
        assert!(!origins.is_allowed(&Url::parse("http://localhost").expect("url")));
    }
}
