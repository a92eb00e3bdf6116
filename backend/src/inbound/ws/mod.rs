//! WebSocket inbound adapter pushing live listing snapshots to views.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list, view gates)
//! - open one listing subscription per connection
//! - keep WebSocket-specific concerns at the edge of the system
//!
//! ```text
//! GET /ws/listings?view=index
//! GET /ws/listings?view=item&id={listing}
//! GET /ws/listings?view=dashboard
//! GET /ws/listings?view=admin
//! ```

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use serde::Deserialize;
use tracing::{error, warn};
use url::Url;

use crate::domain::{
    Access, AdminIdentity, Error, ListingId, ListingScope, SessionState, require_admin,
    require_member,
};
use crate::inbound::http::session::{LOGIN_REQUIRED, SessionContext};

mod session;

pub mod messages;
pub mod state;

use messages::FeedView;
use state::{AllowedOrigins, WsState};

/// Query string of the feed endpoint.
#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub view: FeedView,
    /// Listing id, required by the item view.
    pub id: Option<String>,
}

/// Handle WebSocket upgrade for the live listing feed.
#[get("/ws/listings")]
pub async fn listings_feed(
    state: web::Data<WsState>,
    params: web::Query<FeedParams>,
    session: SessionContext,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    validate_origin(&state.origins, origin_header)?;

    let params = params.into_inner();
    let scope = match params.view {
        FeedView::Index => ListingScope::Latest,
        FeedView::Item => ListingScope::Single(item_id(params.id.as_deref())?),
        FeedView::Dashboard | FeedView::Admin => {
            let session_state = session.state(state.accounts.as_ref()).await?;
            gated_scope(params.view, &session_state, &state.admin)?
        }
    };

    let subscription = state.listings.subscribe(scope);
    let (response, ws_session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        error
    })?;
    actix_web::rt::spawn(session::handle_ws_session(
        params.view,
        subscription,
        ws_session,
        messages,
    ));
    Ok(response)
}

fn item_id(raw: Option<&str>) -> Result<ListingId, Error> {
    let raw = raw.ok_or_else(|| Error::invalid_request("the item view needs an id"))?;
    ListingId::parse(raw).map_err(|_| Error::not_found(format!("listing {raw} not found")))
}

/// Scope for member-only feeds, or the error refusing the upgrade.
fn gated_scope(
    view: FeedView,
    state: &SessionState,
    admin: &AdminIdentity,
) -> Result<ListingScope, Error> {
    let access = match view {
        FeedView::Admin => require_admin(state, admin),
        _ => require_member(state),
    };
    match access {
        Access::Granted(user) => Ok(match view {
            FeedView::Admin => ListingScope::Everything,
            _ => ListingScope::OwnedBy(user.id().clone()),
        }),
        Access::Loading => Err(Error::service_unavailable("session is still loading")),
        Access::LoginRequired => Err(Error::unauthorized(LOGIN_REQUIRED)),
        Access::AccessDenied => Err(Error::forbidden("Access Denied")),
    }
}

fn validate_origin(origins: &AllowedOrigins, origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(error) => {
            error!(error = %error, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if origins.is_allowed(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}
