//! Serves uploaded listing images.
//!
//! ```text
//! GET /media/products/{owner}_{millis}_{file}
//! ```

use actix_web::http::header;
use actix_web::{HttpResponse, get, web};
use tracing::{debug, error};

use crate::domain::ports::{BlobStore, BlobStoreError};
use crate::domain::{BlobPath, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Blob paths embed the upload time, so a path never changes content.
const IMMUTABLE: &str = "public, max-age=31536000, immutable";

fn map_fetch_error(err: BlobStoreError) -> Error {
    match err {
        BlobStoreError::NotFound { .. } => Error::not_found(err.to_string()),
        BlobStoreError::Transfer { message } | BlobStoreError::Url { message } => {
            error!(error = %message, "media fetch failed");
            Error::service_unavailable(message)
        }
    }
}

#[get("/media/{path:.*}")]
pub async fn serve_media(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let raw = path.into_inner();
    let Some(blob_path) = BlobPath::parse(&raw) else {
        debug!(path = %raw, "rejected media path");
        return Err(Error::not_found(format!("no object exists at {raw}")));
    };
    let blob = state.blobs.fetch(&blob_path).await.map_err(map_fetch_error)?;
    Ok(HttpResponse::Ok()
        .content_type(blob.content_type)
        .insert_header((header::CACHE_CONTROL, IMMUTABLE))
        .body(blob.bytes))
}
