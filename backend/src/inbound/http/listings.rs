//! Listing action handlers.
//!
//! ```text
//! POST /api/v1/listings      -> application/x-ndjson progress stream
//! DELETE /api/v1/listings/{id}
//! ```
//!
//! Creation validates everything it can before answering. Once the
//! submission is accepted the response switches to a newline-delimited JSON
//! stream: zero or more `progress` events followed by exactly one `created`
//! or `failed` event.

use actix_web::{HttpResponse, delete, http::header, post, web};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures_util::stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::ports::ListingCommand;
use crate::domain::{
    Error, ImageSelection, ImageTab, ImageUpload, Listing, ListingForm, PreparedListing, TraceId,
    UploadObserver,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::redact_if_internal;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_base64_error, parse_listing_id, upload_too_large_error,
};

/// Media type of the creation progress stream.
pub const NDJSON: &str = "application/x-ndjson";

/// Where the client navigates once a listing is live.
const AFTER_CREATE: &str = "/";

const IMAGE_FILE_FIELD: FieldName = FieldName::new("imageFile");
const LISTING_ID_FIELD: FieldName = FieldName::new("id");

/// File chosen on the upload tab, base64 encoded.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageFilePayload {
    #[schema(example = "phone.jpg")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "image/jpeg")]
    pub content_type: Option<String>,
    /// Standard base64 of the file contents.
    pub data: String,
}

/// Add-product form submission for `POST /api/v1/listings`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateListingRequest {
    #[schema(example = "Phone")]
    pub title: String,
    pub description: String,
    /// Raw price input; non-digits are ignored and an empty value means zero.
    #[schema(example = "500")]
    pub price: String,
    /// Exact category name; empty selects `Other`.
    #[schema(example = "Electronics")]
    pub category: String,
    pub contact: String,
    /// Active image tab: `upload` or `url`.
    #[schema(value_type = String, example = "url")]
    pub image_source: ImageTab,
    pub image_file: Option<ImageFilePayload>,
    #[schema(example = "https://images.example.com/phone.png")]
    pub image_url: Option<String>,
}

/// One line of the creation stream.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CreateListingEvent {
    /// Upload percentage; never decreases within one stream.
    Progress { percent: u8 },
    /// The listing was written.
    Created {
        #[schema(value_type = crate::inbound::http::schemas::ListingSchema)]
        listing: Listing,
        redirect: String,
    },
    /// The submission failed; the form keeps its input and progress resets.
    Failed {
        #[schema(value_type = crate::inbound::http::schemas::ErrorSchema)]
        error: Error,
        progress: u8,
    },
}

impl CreateListingEvent {
    fn created(listing: Listing) -> Self {
        Self::Created {
            listing,
            redirect: AFTER_CREATE.to_owned(),
        }
    }

    fn failed(error: &Error) -> Self {
        Self::Failed {
            error: redact_if_internal(error),
            progress: 0,
        }
    }

    fn to_line(&self) -> Result<web::Bytes, actix_web::Error> {
        let mut line = serde_json::to_vec(self).map_err(actix_web::error::ErrorInternalServerError)?;
        line.push(b'\n');
        Ok(web::Bytes::from(line))
    }
}

impl CreateListingRequest {
    fn into_parts(self, max_upload_bytes: usize) -> Result<(ListingForm, ImageSelection), Error> {
        let Self {
            title,
            description,
            price,
            category,
            contact,
            image_source,
            image_file,
            image_url,
        } = self;
        // Only the active tab is decoded; a stale file behind the URL tab is ignored.
        let file = match (image_source, image_file) {
            (ImageTab::Upload, Some(payload)) => Some(decode_upload(payload, max_upload_bytes)?),
            _ => None,
        };
        let form = ListingForm {
            title,
            description,
            price,
            category,
            contact,
        };
        let selection = ImageSelection {
            tab: image_source,
            file,
            url: image_url.unwrap_or_default(),
        };
        Ok((form, selection))
    }
}

fn decode_upload(payload: ImageFilePayload, limit: usize) -> Result<ImageUpload, Error> {
    let ImageFilePayload {
        name,
        content_type,
        data,
    } = payload;
    // Cheap pre-check so oversized bodies are refused before decoding.
    if data.len().div_ceil(4).saturating_mul(3) > limit.saturating_add(3) {
        return Err(upload_too_large_error(IMAGE_FILE_FIELD, limit));
    }
    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|_| invalid_base64_error(IMAGE_FILE_FIELD))?;
    if bytes.len() > limit {
        return Err(upload_too_large_error(IMAGE_FILE_FIELD, limit));
    }
    let content_type = content_type
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "application/octet-stream".to_owned());
    Ok(ImageUpload::new(name, content_type, bytes))
}

/// Forwards upload percentages into the response stream.
struct StreamProgress(mpsc::UnboundedSender<CreateListingEvent>);

impl UploadObserver for StreamProgress {
    fn on_percent(&self, percent: u8) {
        // A closed receiver means the client went away; the write still completes.
        if self.0.send(CreateListingEvent::Progress { percent }).is_err() {
            debug!(percent, "progress receiver closed");
        }
    }
}

/// Publish a new listing, streaming upload progress.
#[utoipa::path(
    post,
    path = "/api/v1/listings",
    request_body = CreateListingRequest,
    responses(
        (status = 200, description = "Accepted; NDJSON stream of CreateListingEvent lines",
            content_type = "application/x-ndjson", body = CreateListingEvent),
        (status = 400, description = "Invalid form input", body = ErrorSchema),
        (status = 401, description = "Please login to post", body = ErrorSchema),
        (status = 503, description = "Session still loading", body = ErrorSchema)
    ),
    tags = ["listings"],
    operation_id = "createListing"
)]
#[post("/listings")]
pub async fn create_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateListingRequest>,
) -> ApiResult<HttpResponse> {
    let session_state = session.state(state.accounts.as_ref()).await?;
    let (form, selection) = payload.into_inner().into_parts(state.max_upload_bytes)?;
    let prepared = PreparedListing::prepare(&session_state, &form, selection)?;
    debug!(
        owner = %prepared.owner().id(),
        upload_bytes = prepared.upload_len(),
        "listing submission accepted"
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let listings = state.listings.clone();
    let trace_id = TraceId::current();
    let publish = async move {
        let observer = StreamProgress(tx.clone());
        let outcome = match listings.publish(prepared, &observer).await {
            Ok(listing) => CreateListingEvent::created(listing),
            Err(err) => {
                warn!(error = %err, "listing submission failed");
                CreateListingEvent::failed(&err)
            }
        };
        if tx.send(outcome).is_err() {
            debug!("client left before the outcome was sent");
        }
    };
    match trace_id {
        Some(id) => actix_web::rt::spawn(TraceId::scope(id, publish)),
        None => actix_web::rt::spawn(publish),
    };

    let lines = stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((event.to_line(), rx))
    });
    Ok(HttpResponse::Ok()
        .content_type(NDJSON)
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .streaming(lines))
}

/// Delete one listing. Only its owner or the administrator may do so.
#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}",
    params(("id" = String, Path, description = "Listing identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Not the owner or administrator", body = ErrorSchema),
        (status = 404, description = "No such listing", body = ErrorSchema)
    ),
    tags = ["listings"],
    operation_id = "deleteListing"
)]
#[delete("/listings/{id}")]
pub async fn delete_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user(state.accounts.as_ref()).await?;
    let id = parse_listing_id(&path.into_inner(), LISTING_ID_FIELD)?;
    state.listings.delete(&user, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "listings_tests.rs"]
mod tests;
