//! Page view endpoints.
//!
//! ```text
//! GET /                  listings with the filter applied
//! GET /add-product       add-item form description
//! GET /products/{id}     item detail
//! GET /dashboard         the caller's own listings
//! GET /admin             every listing
//! GET /login, /register  sign-in forms
//! ```
//!
//! Every view answers with a [`PageEnvelope`] whose `state` tells the client
//! what to render. Gated views never decide while the session is still
//! resolving; they answer `loading` with `503` and `Retry-After` instead.

use actix_web::http::header::{HeaderValue, RETRY_AFTER};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, get, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::domain::ports::ListingQuery;
use crate::domain::{
    Access, CURRENCY, Category, CategoryFilter, Error, Listing, ListingFilter, ListingId, Price,
    PriceBound, PriceRange, SessionState, User, require_admin, require_member,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::error::RETRY_AFTER_SECS;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Where anonymous visitors are sent from gated views.
pub const LOGIN_PAGE: &str = "/login";

/// Where signed-in visitors are sent from the sign-in forms.
const HOME_PAGE: &str = "/";

/// Category query value that disables the category predicate.
pub const ALL_CATEGORIES: &str = "All";

/// What the client should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageState {
    Loading,
    LoginRequired,
    AccessDenied,
    NotFound,
    Ready,
}

impl PageState {
    fn status(self) -> StatusCode {
        match self {
            Self::Loading => StatusCode::SERVICE_UNAVAILABLE,
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::LoginRequired | Self::Ready => StatusCode::OK,
        }
    }
}

/// Body of every page view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope<T> {
    pub state: PageState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<T>,
}

impl<T: Serialize> PageEnvelope<T> {
    pub fn ready(view: T) -> Self {
        Self {
            state: PageState::Ready,
            redirect: None,
            message: None,
            view: Some(view),
        }
    }

    fn bare(state: PageState) -> Self {
        Self {
            state,
            redirect: None,
            message: None,
            view: None,
        }
    }

    fn loading() -> Self {
        Self::bare(PageState::Loading)
    }

    fn login_required() -> Self {
        Self {
            redirect: Some(LOGIN_PAGE.to_owned()),
            ..Self::bare(PageState::LoginRequired)
        }
    }

    fn access_denied() -> Self {
        Self {
            message: Some("Access Denied".to_owned()),
            ..Self::bare(PageState::AccessDenied)
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::bare(PageState::NotFound)
        }
    }

    fn into_response(self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.state.status());
        builder.insert_header(private_no_cache_header());
        if self.state == PageState::Loading {
            builder.insert_header((RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS)));
        }
        builder.json(self)
    }
}

/// Listing as shown on a card or detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingCard {
    #[serde(flatten)]
    pub listing: Listing,
    /// Image to display, with the placeholder fallback applied.
    pub image_url: String,
    /// Seller name, with the fallback applied.
    pub seller_name: String,
    pub currency: String,
}

impl From<Listing> for ListingCard {
    fn from(listing: Listing) -> Self {
        Self {
            image_url: listing.image().display_url().to_owned(),
            seller_name: listing.owner_name().to_owned(),
            currency: CURRENCY.to_owned(),
            listing,
        }
    }
}

pub fn cards(listings: Vec<Listing>) -> Vec<ListingCard> {
    listings.into_iter().map(ListingCard::from).collect()
}

/// Filter inputs for the index view; also sent over the live feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexQuery {
    /// Exact category name, or `All`.
    pub category: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    /// Which bound moved last: `min` or `max`.
    pub dragged: Option<DraggedBound>,
    pub search: Option<String>,
}

/// Wire form of [`PriceBound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraggedBound {
    Min,
    Max,
}

impl From<DraggedBound> for PriceBound {
    fn from(value: DraggedBound) -> Self {
        match value {
            DraggedBound::Min => Self::Min,
            DraggedBound::Max => Self::Max,
        }
    }
}

impl IndexQuery {
    /// Build the filter over `listings`.
    ///
    /// The price range starts at zero to the highest price present and the
    /// requested bounds are then dragged into place.
    ///
    /// # Errors
    /// Unknown category names are an invalid request.
    pub fn to_filter(&self, listings: &[Listing]) -> Result<ListingFilter, Error> {
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") | Some(ALL_CATEGORIES) => CategoryFilter::All,
            Some(name) => CategoryFilter::Only(name.parse::<Category>().map_err(|err| {
                Error::invalid_request(err.to_string()).with_details(json!({ "field": "category" }))
            })?),
        };
        let mut price = PriceRange::covering(listings);
        price.drag_both(
            self.min_price.map(Price::new),
            self.max_price.map(Price::new),
            self.dragged.map(PriceBound::from).unwrap_or_default(),
        );
        Ok(ListingFilter::new(
            category,
            price,
            self.search.as_deref().unwrap_or_default().trim(),
        ))
    }
}

/// Filter the view applied, echoed so the client can draw its controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilter {
    pub category: String,
    pub min_price: Price,
    pub max_price: Price,
    pub search: String,
    /// Highest price in the whole collection, the slider's upper end.
    pub highest_price: Price,
}

impl AppliedFilter {
    pub fn new(filter: &ListingFilter, listings: &[Listing]) -> Self {
        let category = match filter.category() {
            CategoryFilter::All => ALL_CATEGORIES.to_owned(),
            CategoryFilter::Only(category) => category.as_str().to_owned(),
        };
        Self {
            category,
            min_price: filter.price().min(),
            max_price: filter.price().max(),
            search: filter.search().to_owned(),
            highest_price: PriceRange::covering(listings).max(),
        }
    }
}

fn category_names() -> Vec<String> {
    std::iter::once(ALL_CATEGORIES)
        .chain(Category::ALL.iter().map(|category| category.as_str()))
        .map(str::to_owned)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexView {
    pub listings: Vec<ListingCard>,
    pub filter: AppliedFilter,
    /// Category choices, starting with `All`.
    pub categories: Vec<String>,
    /// Size of the unfiltered collection.
    pub total: usize,
}

impl IndexView {
    /// Apply `query` to `listings` (newest first).
    ///
    /// # Errors
    /// See [`IndexQuery::to_filter`].
    pub fn build(listings: &[Listing], query: &IndexQuery) -> Result<Self, Error> {
        let filter = query.to_filter(listings)?;
        Ok(Self {
            listings: cards(filter.apply(listings)),
            filter: AppliedFilter::new(&filter, listings),
            categories: category_names(),
            total: listings.len(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProductView {
    pub categories: Vec<String>,
    pub default_category: String,
    pub currency: String,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: usize,
    pub seller: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub listing: ListingCard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub user: User,
    pub listings: Vec<ListingCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminView {
    pub admin: User,
    pub listings: Vec<ListingCard>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthFormView {
    /// Whether a session is already active.
    pub signed_in: bool,
    /// Where to go instead when already signed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// Gate a view, answering early unless access is granted.
fn gate<T: Serialize>(access: Access) -> Result<User, PageEnvelope<T>> {
    match access {
        Access::Granted(user) => Ok(user),
        Access::Loading => Err(PageEnvelope::loading()),
        Access::LoginRequired => Err(PageEnvelope::login_required()),
        Access::AccessDenied => Err(PageEnvelope::access_denied()),
    }
}

#[get("/")]
pub async fn index_page(
    state: web::Data<HttpState>,
    query: web::Query<IndexQuery>,
) -> ApiResult<HttpResponse> {
    let listings = state.listings_query.latest().await?;
    let view = IndexView::build(&listings, &query)?;
    debug!(
        visible = view.listings.len(),
        total = view.total,
        "index rendered"
    );
    Ok(PageEnvelope::ready(view).into_response())
}

#[get("/add-product")]
pub async fn add_product_page(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let session_state = session.state(state.accounts.as_ref()).await?;
    let seller = match gate::<AddProductView>(require_member(&session_state)) {
        Ok(user) => user,
        Err(envelope) => return Ok(envelope.into_response()),
    };
    let view = AddProductView {
        categories: Category::ALL
            .iter()
            .map(|category| category.as_str().to_owned())
            .collect(),
        default_category: Category::default().as_str().to_owned(),
        currency: CURRENCY.to_owned(),
        max_upload_bytes: state.max_upload_bytes,
        seller,
    };
    Ok(PageEnvelope::ready(view).into_response())
}

#[get("/products/{id}")]
pub async fn item_page(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let raw = path.into_inner();
    let missing = || PageEnvelope::<ItemView>::not_found(format!("No item with id {raw}"));
    // A malformed id in a deep link is just another item that does not exist.
    let Ok(id) = ListingId::parse(&raw) else {
        return Ok(missing().into_response());
    };
    match state.listings_query.find(&id).await? {
        Some(listing) => Ok(PageEnvelope::ready(ItemView {
            listing: listing.into(),
        })
        .into_response()),
        None => Ok(missing().into_response()),
    }
}

#[get("/dashboard")]
pub async fn dashboard_page(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let session_state = session.state(state.accounts.as_ref()).await?;
    let user = match gate::<DashboardView>(require_member(&session_state)) {
        Ok(user) => user,
        Err(envelope) => return Ok(envelope.into_response()),
    };
    let listings = state.listings_query.owned_by(user.id()).await?;
    Ok(PageEnvelope::ready(DashboardView {
        user,
        listings: cards(listings),
    })
    .into_response())
}

#[get("/admin")]
pub async fn admin_page(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let session_state = session.state(state.accounts.as_ref()).await?;
    let admin = match gate::<AdminView>(require_admin(&session_state, &state.admin)) {
        Ok(user) => user,
        Err(envelope) => return Ok(envelope.into_response()),
    };
    let listings = state.listings_query.everything().await?;
    Ok(PageEnvelope::ready(AdminView {
        admin,
        total: listings.len(),
        listings: cards(listings),
    })
    .into_response())
}

async fn auth_form(state: &HttpState, session: &SessionContext) -> ApiResult<HttpResponse> {
    let envelope = match session.state(state.accounts.as_ref()).await? {
        SessionState::Resolving => PageEnvelope::<AuthFormView>::loading(),
        SessionState::Anonymous => PageEnvelope::ready(AuthFormView {
            signed_in: false,
            redirect: None,
        }),
        SessionState::Authenticated(_) => PageEnvelope::ready(AuthFormView {
            signed_in: true,
            redirect: Some(HOME_PAGE.to_owned()),
        }),
    };
    Ok(envelope.into_response())
}

#[get("/login")]
pub async fn login_page(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    auth_form(&state, &session).await
}

#[get("/register")]
pub async fn register_page(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    auth_form(&state, &session).await
}
