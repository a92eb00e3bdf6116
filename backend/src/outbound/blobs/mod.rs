//! Blob store adapters for uploaded listing images.
//!
//! Both adapters write in fixed-size chunks and report byte progress after
//! each one. Stored blobs are served back under `media/` relative to the
//! configured public base URL, with the media type implied by the path's
//! extension; the type a client declares is never echoed back.

mod filesystem;
mod memory;

pub use filesystem::FilesystemBlobStore;
pub use memory::MemoryBlobStore;

use tracing::debug;
use url::Url;

use crate::domain::{BlobPath, ImageUpload};
use crate::domain::ports::BlobStoreError;

/// Bytes written between progress reports.
pub const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Route prefix stored blobs are served from.
pub const MEDIA_ROUTE: &str = "media";

/// Treat `base` as a directory so joins append rather than replace.
fn directory_url(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

fn media_url(base: &Url, path: &BlobPath) -> Result<Url, BlobStoreError> {
    base.join(&format!("{MEDIA_ROUTE}/{path}"))
        .map_err(|err| BlobStoreError::url(format!("cannot build URL for {path}: {err}")))
}

/// Media type inferred from the file extension.
pub fn content_type_for(path: &BlobPath) -> &'static str {
    let extension = path
        .as_str()
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Media type a stored upload is served with.
fn served_content_type(path: &BlobPath, upload: &ImageUpload) -> &'static str {
    let served = content_type_for(path);
    if !upload.content_type().eq_ignore_ascii_case(served) {
        debug!(
            path = %path,
            declared = upload.content_type(),
            served,
            "declared media type overridden"
        );
    }
    served
}

fn byte_len(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:8080", "http://localhost:8080/media/products/a.png")]
    #[case("https://market.example.com/app", "https://market.example.com/app/media/products/a.png")]
    #[case("https://market.example.com/app/", "https://market.example.com/app/media/products/a.png")]
    fn media_urls_hang_off_the_base(#[case] base: &str, #[case] expected: &str) {
        let base = directory_url(Url::parse(base).expect("url"));
        let path = BlobPath::parse("products/a.png").expect("path");
        assert_eq!(media_url(&base, &path).expect("join").as_str(), expected);
    }

    #[rstest]
    #[case("products/a.PNG", "image/png")]
    #[case("products/a.jpeg", "image/jpeg")]
    #[case("products/archive", "application/octet-stream")]
    fn content_type_follows_extension(#[case] raw: &str, #[case] expected: &str) {
        let path = BlobPath::parse(raw).expect("path");
        assert_eq!(content_type_for(&path), expected);
    }
}
