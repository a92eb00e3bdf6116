//! Driven port for uploaded image storage.

use async_trait::async_trait;
use url::Url;

use crate::domain::{BlobPath, ImageUpload, MonotonicProgress};

use super::define_port_error;

define_port_error! {
    /// Errors raised by blob store adapters.
    pub enum BlobStoreError {
        /// Nothing is stored at the path.
        NotFound { path: String } => "no object exists at {path}",
        /// Upload was rejected or interrupted.
        Transfer { message: String } => "{message}",
        /// The public URL could not be derived.
        Url { message: String } => "{message}",
    }
}

/// Stored bytes together with their media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `upload` at `path`, reporting raw byte progress as it goes.
    async fn upload(
        &self,
        path: &BlobPath,
        upload: &ImageUpload,
        progress: &MonotonicProgress<'_>,
    ) -> Result<(), BlobStoreError>;

    /// Publicly resolvable URL for a stored blob.
    async fn public_url(&self, path: &BlobPath) -> Result<Url, BlobStoreError>;

    async fn fetch(&self, path: &BlobPath) -> Result<StoredBlob, BlobStoreError>;

    /// Remove a blob; removing a missing blob is not an error.
    async fn remove(&self, path: &BlobPath) -> Result<(), BlobStoreError>;
}
