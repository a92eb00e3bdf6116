//! Image selection on the add-product form.
//!
//! The form offers two mutually exclusive tabs. Whatever the other tab
//! holds is ignored; only the active tab decides the listing's image.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

static IMAGE_URL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^https?://.+\..+$").ok());

/// Failures resolving the image of a new listing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageSelectionError {
    #[error("Please add an image or URL")]
    Missing,
    #[error("Please enter a valid image URL")]
    InvalidUrl,
}

/// Active tab of the image picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageTab {
    #[default]
    Upload,
    Url,
}

/// File picked on the upload tab.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Externally hosted image URL that passed the shape check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrl(Url);

impl ImageUrl {
    /// Accept `http(s)://` URLs whose remainder contains a dot.
    ///
    /// # Examples
    /// ```
    /// use marketplace::domain::ImageUrl;
    ///
    /// assert!(ImageUrl::parse(" https://i.example.com/a.png ").is_ok());
    /// assert!(ImageUrl::parse("ftp://example.com/a.png").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ImageSelectionError> {
        let trimmed = raw.trim();
        let shaped = IMAGE_URL_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(trimmed));
        if !shaped {
            return Err(ImageSelectionError::InvalidUrl);
        }
        Url::parse(trimmed)
            .map(Self)
            .map_err(|_| ImageSelectionError::InvalidUrl)
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

/// Everything the image picker currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSelection {
    pub tab: ImageTab,
    pub file: Option<ImageUpload>,
    pub url: String,
}

/// Resolved image for a new listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Upload(ImageUpload),
    Url(ImageUrl),
}

impl ImageSelection {
    /// Resolve the active tab, ignoring the inactive one.
    pub fn resolve(self) -> Result<ImageSource, ImageSelectionError> {
        match self.tab {
            ImageTab::Upload => match self.file {
                Some(file) if !file.is_empty() => Ok(ImageSource::Upload(file)),
                _ => Err(ImageSelectionError::Missing),
            },
            ImageTab::Url if self.url.trim().is_empty() => Err(ImageSelectionError::Missing),
            ImageTab::Url => ImageUrl::parse(&self.url).map(ImageSource::Url),
        }
    }
}
