//! In-process `BlobStore`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use url::Url;

use super::{UPLOAD_CHUNK_BYTES, byte_len, directory_url, media_url, served_content_type};
use crate::domain::ports::{BlobStore, BlobStoreError, StoredBlob};
use crate::domain::{BlobPath, ImageUpload, MonotonicProgress, UploadProgress};

/// Blobs held in memory, served under the given public base URL.
pub struct MemoryBlobStore {
    base_url: Url,
    blobs: RwLock<HashMap<BlobPath, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: directory_url(base_url),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored blobs.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        path: &BlobPath,
        upload: &ImageUpload,
        progress: &MonotonicProgress<'_>,
    ) -> Result<(), BlobStoreError> {
        let total = byte_len(upload.len());
        let mut bytes = Vec::with_capacity(upload.len());
        for chunk in upload.bytes().chunks(UPLOAD_CHUNK_BYTES) {
            bytes.extend_from_slice(chunk);
            progress.record(UploadProgress {
                transferred: byte_len(bytes.len()),
                total,
            });
            tokio::task::yield_now().await;
        }
        self.blobs.write().await.insert(
            path.clone(),
            StoredBlob {
                content_type: served_content_type(path, upload).to_owned(),
                bytes,
            },
        );
        Ok(())
    }

    async fn public_url(&self, path: &BlobPath) -> Result<Url, BlobStoreError> {
        if !self.blobs.read().await.contains_key(path) {
            return Err(BlobStoreError::not_found(path.as_str()));
        }
        media_url(&self.base_url, path)
    }

    async fn fetch(&self, path: &BlobPath) -> Result<StoredBlob, BlobStoreError> {
        self.blobs
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| BlobStoreError::not_found(path.as_str()))
    }

    async fn remove(&self, path: &BlobPath) -> Result<(), BlobStoreError> {
        self.blobs.write().await.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IgnoreProgress;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn stored_blob_round_trips_with_its_media_type() {
        let store = MemoryBlobStore::new(Url::parse("http://localhost:8080").expect("url"));
        let path = BlobPath::parse("products/u_1_a.png").expect("path");
        let upload = ImageUpload::new("a.png", "image/png", vec![1; UPLOAD_CHUNK_BYTES + 1]);
        let ignore = IgnoreProgress;
        let progress = MonotonicProgress::new(&ignore);

        store.upload(&path, &upload, &progress).await.expect("upload");

        assert_eq!(progress.last_percent(), Some(100));
        let url = store.public_url(&path).await.expect("url");
        assert_eq!(url.as_str(), "http://localhost:8080/media/products/u_1_a.png");
        let blob = store.fetch(&path).await.expect("fetch");
        assert_eq!(blob.content_type, "image/png");
        assert_eq!(blob.bytes.len(), UPLOAD_CHUNK_BYTES + 1);

        store.remove(&path).await.expect("remove");
        assert!(store.is_empty().await);
        assert!(matches!(
            store.public_url(&path).await,
            Err(BlobStoreError::NotFound { .. })
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn declared_content_type_is_not_served() {
        let store = MemoryBlobStore::new(Url::parse("http://localhost:8080").expect("url"));
        let path = BlobPath::parse("products/u_1_a.png").expect("path");
        let upload = ImageUpload::new("a.png", "text/html", vec![7; 16]);
        let ignore = IgnoreProgress;
        let progress = MonotonicProgress::new(&ignore);

        store.upload(&path, &upload, &progress).await.expect("upload");

        let blob = store.fetch(&path).await.expect("fetch");
        assert_eq!(blob.content_type, "image/png");
    }
}
