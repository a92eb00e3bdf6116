//! Runtime configuration loaded via OrthoConfig.
//!
//! Values come from `MARKETPLACE_*` environment variables, an optional
//! configuration file and command-line flags. Every field is optional; the
//! accessors apply defaults and validate.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{AdminIdentity, UserId};
use crate::inbound::http::state::DEFAULT_MAX_UPLOAD_BYTES;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080/";

/// Invalid configuration values.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {message}")]
    BindAddr { value: String, message: String },
    #[error("invalid administrator id '{value}': {message}")]
    AdminUserId { value: String, message: String },
    #[error("invalid public base URL '{value}': {message}")]
    PublicBaseUrl { value: String, message: String },
    #[error("max upload size must be at least one byte")]
    EmptyUploadLimit,
}

/// Marketplace server settings.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MARKETPLACE")]
pub struct MarketplaceSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// User id of the administrator; no administrator when unset.
    pub admin_user_id: Option<String>,
    /// Base URL the site is served from; media URLs are built under it.
    pub public_base_url: Option<String>,
    /// Directory for uploaded images; kept in memory when unset.
    pub blob_root: Option<PathBuf>,
    /// Largest accepted image upload, in bytes.
    pub max_upload_bytes: Option<usize>,
}

impl MarketplaceSettings {
    /// Address to bind, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    /// [`SettingsError::BindAddr`] when the value is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR).trim();
        value.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: value.to_owned(),
            message: err.to_string(),
        })
    }

    /// Configured administrator.
    ///
    /// # Errors
    /// [`SettingsError::AdminUserId`] when the id is not a UUID.
    pub fn admin(&self) -> Result<AdminIdentity, SettingsError> {
        let Some(raw) = self.admin_user_id.as_deref().map(str::trim) else {
            return Ok(AdminIdentity::default());
        };
        if raw.is_empty() {
            return Ok(AdminIdentity::default());
        }
        UserId::new(raw)
            .map(|id| AdminIdentity::new(Some(id)))
            .map_err(|err| SettingsError::AdminUserId {
                value: raw.to_owned(),
                message: err.to_string(),
            })
    }

    /// Public base URL, always ending in `/` so relative joins keep its path.
    ///
    /// # Errors
    /// [`SettingsError::PublicBaseUrl`] when the value is not an absolute
    /// `http` or `https` URL.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use marketplace::settings::MarketplaceSettings;
    ///
    /// let settings = MarketplaceSettings {
    ///     public_base_url: Some("https://market.example.edu/shop".to_owned()),
    ///     ..MarketplaceSettings::default()
    /// };
    /// let url = settings.public_base_url().expect("valid url");
    /// assert_eq!(url.as_str(), "https://market.example.edu/shop/");
    /// ```
    pub fn public_base_url(&self) -> Result<Url, SettingsError> {
        let value = self
            .public_base_url
            .as_deref()
            .unwrap_or(DEFAULT_PUBLIC_BASE_URL)
            .trim();
        let invalid = |message: String| SettingsError::PublicBaseUrl {
            value: value.to_owned(),
            message,
        };
        let mut url = Url::parse(value).map_err(|err| invalid(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https".to_owned()));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Filesystem root for uploaded images, if configured.
    pub fn blob_root(&self) -> Option<&Path> {
        self.blob_root.as_deref()
    }

    /// Upload size limit, defaulting to 5 MiB.
    ///
    /// # Errors
    /// [`SettingsError::EmptyUploadLimit`] for a zero limit.
    pub fn max_upload_bytes(&self) -> Result<usize, SettingsError> {
        match self.max_upload_bytes {
            Some(0) => Err(SettingsError::EmptyUploadLimit),
            Some(limit) => Ok(limit),
            None => Ok(DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}
