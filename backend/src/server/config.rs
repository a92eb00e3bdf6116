//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::PathBuf;

use marketplace::domain::AdminIdentity;
use marketplace::inbound::http::session_config::SessionSettings;
use marketplace::settings::{MarketplaceSettings, SettingsError};
use url::Url;

/// Validated configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) public_base_url: Url,
    pub(crate) admin: AdminIdentity,
    pub(crate) blob_root: Option<PathBuf>,
    pub(crate) max_upload_bytes: usize,
}

impl ServerConfig {
    /// Validate loaded settings and pair them with the session cookie settings.
    ///
    /// # Errors
    /// Returns the first invalid setting.
    pub fn from_settings(
        settings: &MarketplaceSettings,
        session: SessionSettings,
    ) -> Result<Self, SettingsError> {
        Ok(Self {
            session,
            bind_addr: settings.bind_addr()?,
            public_base_url: settings.public_base_url()?,
            admin: settings.admin()?,
            blob_root: settings.blob_root().map(PathBuf::from),
            max_upload_bytes: settings.max_upload_bytes()?,
        })
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
