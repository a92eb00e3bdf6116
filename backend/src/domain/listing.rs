//! Listing aggregate and the value types that make it up.
//!
//! A listing is created once by its owner and afterwards only ever deleted;
//! there is no edit path. Identifier and creation time are assigned by the
//! document store at write time.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;
use uuid::Uuid;

use super::{User, UserId};

/// Image shown when a listing has no usable image reference.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.png";
/// Seller name shown when the owner had no display name at creation time.
pub const FALLBACK_OWNER_NAME: &str = "User";
/// Currency every price is interpreted in.
pub const CURRENCY: &str = "BDT";

/// Validation failures for listing form input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingValidationError {
    #[error("listing id must be a valid UUID")]
    InvalidId,
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("description must not be empty")]
    EmptyDescription,
    #[error("contact must not be empty")]
    EmptyContact,
    #[error("price is too large")]
    PriceTooLarge,
    #[error("category must be one of Electronics, Books, Furniture, Clothing, Other")]
    UnknownCategory { value: String },
}

impl ListingValidationError {
    /// Form field the failure belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::EmptyTitle => "title",
            Self::EmptyDescription => "description",
            Self::EmptyContact => "contact",
            Self::PriceTooLarge => "price",
            Self::UnknownCategory { .. } => "category",
        }
    }
}

/// Store-assigned listing identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(Uuid);

impl ListingId {
    /// Parse an identifier taken from a path or message.
    pub fn parse(raw: &str) -> Result<Self, ListingValidationError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| ListingValidationError::InvalidId)
    }

    /// Mint a new identifier; only document stores should call this.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Fixed set of listing categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Books,
    Furniture,
    Clothing,
    #[default]
    Other,
}

impl Category {
    /// Every category in display order.
    pub const ALL: [Self; 5] = [
        Self::Electronics,
        Self::Books,
        Self::Furniture,
        Self::Clothing,
        Self::Other,
    ];

    /// Exact name used on the wire and in forms.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Electronics => "Electronics",
            Self::Books => "Books",
            Self::Furniture => "Furniture",
            Self::Clothing => "Clothing",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ListingValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ListingValidationError::UnknownCategory {
                value: s.to_owned(),
            })
    }
}

/// Non-negative whole amount in [`CURRENCY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    /// Zero, also the value of a missing price.
    pub const ZERO: Self = Self(0);

    /// Wrap a known amount.
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Amount in whole currency units.
    #[must_use]
    pub const fn amount(self) -> u64 {
        self.0
    }

    /// Coerce form input into a price.
    ///
    /// Every character that is not an ASCII digit is dropped, so `"1,200"`
    /// reads as 1200. Input with no digits at all becomes zero.
    pub fn parse_lenient(raw: &str) -> Result<Self, ListingValidationError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            if !raw.trim().is_empty() {
                warn!(input = raw, "price input has no digits; defaulting to zero");
            }
            return Ok(Self::ZERO);
        }
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ListingValidationError::PriceTooLarge)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CURRENCY} {}", self.0)
    }
}

/// Image URL as stored on the listing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Reference a validated or store-resolved URL.
    pub fn from_url(url: &Url) -> Self {
        Self(url.as_str().to_owned())
    }

    /// Wrap a value read back from a store without re-validating it.
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw stored value.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// URL to render: surrounding quotes stripped, placeholder when empty.
    pub fn display_url(&self) -> &str {
        let cleaned = self.0.trim().trim_matches('"');
        if cleaned.is_empty() {
            PLACEHOLDER_IMAGE
        } else {
            cleaned
        }
    }
}

/// Raw add-product form fields as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingForm {
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub contact: String,
}

/// Validated text fields of a listing, before an image is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDraft {
    title: String,
    description: String,
    price: Price,
    category: Category,
    contact: String,
}

fn required(raw: &str, error: ListingValidationError) -> Result<String, ListingValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(error)
    } else {
        Ok(trimmed.to_owned())
    }
}

impl ListingDraft {
    /// Build a draft from already-typed values.
    pub fn new(
        title: &str,
        description: &str,
        price: Price,
        category: Category,
        contact: &str,
    ) -> Result<Self, ListingValidationError> {
        Ok(Self {
            title: required(title, ListingValidationError::EmptyTitle)?,
            description: required(description, ListingValidationError::EmptyDescription)?,
            price,
            category,
            contact: required(contact, ListingValidationError::EmptyContact)?,
        })
    }

    /// Validate raw form input. An empty category selects the default.
    pub fn from_form(form: &ListingForm) -> Result<Self, ListingValidationError> {
        let category = match form.category.trim() {
            "" => Category::default(),
            name => name.parse()?,
        };
        let price = Price::parse_lenient(&form.price)?;
        Self::new(
            &form.title,
            &form.description,
            price,
            category,
            &form.contact,
        )
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

/// Listing ready to be written; id and timestamp still unassigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListing {
    draft: ListingDraft,
    image: ImageRef,
    owner: UserId,
    owner_name: String,
}

impl NewListing {
    /// Attach the image and capture the owner from the session.
    pub fn new(draft: ListingDraft, image: ImageRef, owner: &User) -> Self {
        Self {
            draft,
            image,
            owner: owner.id().clone(),
            owner_name: owner.display_name().to_string(),
        }
    }

    /// Owner captured at creation.
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Image reference to store.
    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    /// Validated text fields.
    pub fn draft(&self) -> &ListingDraft {
        &self.draft
    }
}

/// Persisted for-sale item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    id: ListingId,
    title: String,
    description: String,
    price: Price,
    category: Category,
    contact: String,
    image: ImageRef,
    owner: UserId,
    owner_name: String,
    created_at: DateTime<Utc>,
}

impl Listing {
    /// Materialise a written record from the store-assigned parts.
    pub fn from_parts(id: ListingId, created_at: DateTime<Utc>, new: NewListing) -> Self {
        let NewListing {
            draft,
            image,
            owner,
            owner_name,
        } = new;
        let ListingDraft {
            title,
            description,
            price,
            category,
            contact,
        } = draft;
        Self {
            id,
            title,
            description,
            price,
            category,
            contact,
            image,
            owner,
            owner_name,
            created_at,
        }
    }

    pub fn id(&self) -> ListingId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Seller name with the display fallback applied.
    pub fn owner_name(&self) -> &str {
        if self.owner_name.trim().is_empty() {
            FALLBACK_OWNER_NAME
        } else {
            &self.owner_name
        }
    }

    /// Store-assigned creation time; the only sort key.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
