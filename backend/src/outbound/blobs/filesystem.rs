//! `BlobStore` backed by a directory on local disk.
//!
//! All file access goes through a `cap_std` directory capability rooted at
//! the configured blob root, so request-supplied paths cannot escape it.
//! Every filesystem call runs on the blocking pool; uploads hop there once
//! per chunk and report progress after each chunk lands.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;
use url::Url;

use super::{
    UPLOAD_CHUNK_BYTES, byte_len, content_type_for, directory_url, media_url, served_content_type,
};
use crate::domain::ports::{BlobStore, BlobStoreError, StoredBlob};
use crate::domain::{BlobPath, ImageUpload, MonotonicProgress, UploadProgress};

fn transfer_error(path: &BlobPath, err: &io::Error) -> BlobStoreError {
    BlobStoreError::transfer(format!("could not write {path}: {err}"))
}

/// Run a filesystem call off the async workers.
async fn blocking<T, F>(op: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(io::Error::other)?
}

/// Blobs stored as files below a root directory.
pub struct FilesystemBlobStore {
    root: Arc<Dir>,
    base_url: Url,
}

impl FilesystemBlobStore {
    /// Open (creating if needed) the blob root.
    ///
    /// Called once at start-up, before the server accepts traffic.
    ///
    /// # Errors
    /// Returns the underlying I/O error when the directory cannot be created
    /// or opened.
    pub fn open(root: &Path, base_url: Url) -> io::Result<Self> {
        Dir::create_ambient_dir_all(root, ambient_authority())?;
        let root = Dir::open_ambient_dir(root, ambient_authority())?;
        Ok(Self {
            root: Arc::new(root),
            base_url: directory_url(base_url),
        })
    }

    fn relative(path: &BlobPath) -> PathBuf {
        PathBuf::from(path.as_str())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn upload(
        &self,
        path: &BlobPath,
        upload: &ImageUpload,
        progress: &MonotonicProgress<'_>,
    ) -> Result<(), BlobStoreError> {
        let root = Arc::clone(&self.root);
        let relative = Self::relative(path);
        let mut file = blocking(move || {
            if let Some(parent) = relative.parent().filter(|p| !p.as_os_str().is_empty()) {
                root.create_dir_all(parent)?;
            }
            root.create(&relative)
        })
        .await
        .map_err(|err| transfer_error(path, &err))?;

        let total = byte_len(upload.len());
        let mut written = 0_u64;
        for chunk in upload.bytes().chunks(UPLOAD_CHUNK_BYTES) {
            let owned = chunk.to_vec();
            file = blocking(move || {
                file.write_all(&owned)?;
                Ok(file)
            })
            .await
            .map_err(|err| transfer_error(path, &err))?;
            written += byte_len(chunk.len());
            progress.record(UploadProgress {
                transferred: written,
                total,
            });
        }
        blocking(move || file.sync_all())
            .await
            .map_err(|err| transfer_error(path, &err))?;
        debug!(
            path = %path,
            bytes = written,
            content_type = served_content_type(path, upload),
            "blob written"
        );
        Ok(())
    }

    async fn public_url(&self, path: &BlobPath) -> Result<Url, BlobStoreError> {
        let root = Arc::clone(&self.root);
        let relative = Self::relative(path);
        let exists = blocking(move || Ok(root.exists(&relative)))
            .await
            .map_err(|err| BlobStoreError::transfer(format!("could not stat {path}: {err}")))?;
        if !exists {
            return Err(BlobStoreError::not_found(path.as_str()));
        }
        media_url(&self.base_url, path)
    }

    async fn fetch(&self, path: &BlobPath) -> Result<StoredBlob, BlobStoreError> {
        let root = Arc::clone(&self.root);
        let relative = Self::relative(path);
        match blocking(move || root.read(&relative)).await {
            Ok(bytes) => Ok(StoredBlob {
                content_type: content_type_for(path).to_owned(),
                bytes,
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(BlobStoreError::not_found(path.as_str()))
            }
            Err(err) => Err(BlobStoreError::transfer(format!(
                "could not read {path}: {err}"
            ))),
        }
    }

    async fn remove(&self, path: &BlobPath) -> Result<(), BlobStoreError> {
        let root = Arc::clone(&self.root);
        let relative = Self::relative(path);
        match blocking(move || root.remove_file(&relative)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(BlobStoreError::transfer(format!(
                "could not remove {path}: {err}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IgnoreProgress, UploadObserver};
    use rstest::{fixture, rstest};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct Percentages(Mutex<Vec<u8>>);

    impl UploadObserver for Percentages {
        fn on_percent(&self, percent: u8) {
            self.0.lock().expect("lock").push(percent);
        }
    }

    #[fixture]
    fn root() -> TempDir {
        TempDir::new().expect("temp dir")
    }

    fn store(root: &TempDir) -> FilesystemBlobStore {
        FilesystemBlobStore::open(
            &root.path().join("blobs"),
            Url::parse("https://market.example.com").expect("url"),
        )
        .expect("open store")
    }

    #[rstest]
    #[tokio::test]
    async fn chunked_write_reports_progress_and_reads_back(root: TempDir) {
        let store = store(&root);
        let path = BlobPath::parse("products/u_9_photo.jpg").expect("path");
        let bytes: Vec<u8> = (0..(UPLOAD_CHUNK_BYTES * 3))
            .map(|i| u8::try_from(i % 251).expect("below 251"))
            .collect();
        let upload = ImageUpload::new("photo.jpg", "image/jpeg", bytes.clone());
        let seen = Percentages::default();
        let progress = MonotonicProgress::new(&seen);

        store.upload(&path, &upload, &progress).await.expect("upload");

        assert_eq!(*seen.0.lock().expect("lock"), vec![33, 66, 100]);
        let blob = store.fetch(&path).await.expect("fetch");
        assert_eq!(blob.bytes, bytes);
        assert_eq!(blob.content_type, "image/jpeg");
        assert_eq!(
            store.public_url(&path).await.expect("url").as_str(),
            "https://market.example.com/media/products/u_9_photo.jpg"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn missing_blobs_are_not_found_and_removal_is_idempotent(root: TempDir) {
        let store = store(&root);
        let path = BlobPath::parse("products/nothing.png").expect("path");
        assert!(matches!(
            store.fetch(&path).await,
            Err(BlobStoreError::NotFound { .. })
        ));
        store.remove(&path).await.expect("remove missing");
    }

    #[rstest]
    #[tokio::test]
    async fn declared_content_type_is_not_served(root: TempDir) {
        let store = store(&root);
        let path = BlobPath::parse("products/u_9_photo.png").expect("path");
        let upload = ImageUpload::new("photo.png", "text/html", vec![3; 32]);
        let ignore = IgnoreProgress;
        let progress = MonotonicProgress::new(&ignore);

        store.upload(&path, &upload, &progress).await.expect("upload");

        let blob = store.fetch(&path).await.expect("fetch");
        assert_eq!(blob.content_type, "image/png");
    }

    #[rstest]
    #[tokio::test(flavor = "current_thread")]
    async fn other_tasks_run_while_uploading(root: TempDir) {
        let store = store(&root);
        let path = BlobPath::parse("products/u_9_big.jpg").expect("path");
        let upload = ImageUpload::new("big.jpg", "image/jpeg", vec![5; UPLOAD_CHUNK_BYTES * 8]);
        let ticks = Arc::new(AtomicUsize::new(0));

        let ticker = {
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, Ordering::Relaxed);
                    tokio::task::yield_now().await;
                }
            })
        };
        let ignore = IgnoreProgress;
        let progress = MonotonicProgress::new(&ignore);
        store.upload(&path, &upload, &progress).await.expect("upload");
        ticker.abort();

        assert!(
            ticks.load(Ordering::Relaxed) > 0,
            "other tasks must run while the upload is in flight"
        );
    }
}
