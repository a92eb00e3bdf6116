//! Wire-level message definitions for the live listing feed.
//!
//! Every frame is a JSON object tagged by `type`.

use serde::{Deserialize, Serialize};

use crate::domain::{Error, Listing, ListingFilter, ListingId};
use crate::inbound::http::error::redact_if_internal;
use crate::inbound::http::pages::{AppliedFilter, IndexQuery, ListingCard, cards};

/// Which page a connection feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedView {
    Index,
    Item,
    Dashboard,
    Admin,
}

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// New filter inputs for the index view.
    Filter(IndexQuery),
}

/// Frames sent to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Current contents of the view.
    #[serde(rename_all = "camelCase")]
    Snapshot {
        view: FeedView,
        listings: Vec<ListingCard>,
        /// Filter applied on the index view.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<AppliedFilter>,
        /// Size of the collection before filtering.
        total: usize,
    },
    /// The item a detail feed follows no longer exists.
    NotFound { id: ListingId },
    /// A client frame or the feed itself failed.
    Error {
        #[serde(flatten)]
        error: Error,
    },
}

impl ServerMessage {
    /// Snapshot of an unfiltered view.
    pub fn snapshot(view: FeedView, listings: Vec<Listing>) -> Self {
        Self::Snapshot {
            view,
            total: listings.len(),
            listings: cards(listings),
            filter: None,
        }
    }

    /// Snapshot of the index view with `filter` applied.
    pub fn filtered(listings: &[Listing], filter: &ListingFilter) -> Self {
        Self::Snapshot {
            view: FeedView::Index,
            total: listings.len(),
            listings: cards(filter.apply(listings)),
            filter: Some(AppliedFilter::new(filter, listings)),
        }
    }

    pub fn error(error: &Error) -> Self {
        Self::Error {
            error: redact_if_internal(error),
        }
    }
}

/// Re-derive the index filter from client input.
///
/// # Errors
/// Unknown categories are rejected; see [`IndexQuery::to_filter`].
pub fn filter_for(query: &IndexQuery, listings: &[Listing]) -> Result<ListingFilter, Error> {
    query.to_filter(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Category, DisplayName, EmailAddress, ImageRef, ListingDraft, NewListing, Price, User,
        UserId,
    };
    use chrono::{TimeZone, Utc};
    use insta::assert_json_snapshot;
    use rstest::{fixture, rstest};

    #[fixture]
    fn listings() -> Vec<Listing> {
        let owner = User::new(
            UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("owner id"),
            DisplayName::new("Rafi").expect("name"),
            EmailAddress::new("rafi@example.com").expect("email"),
        );
        let at = Utc
            .with_ymd_and_hms(2025, 3, 1, 9, 30, 0)
            .single()
            .expect("timestamp");
        [
            ("7b0c5a1e-0d5e-4c59-9d1c-1f0f3b0a9e01", "Phone case", 1200, Category::Electronics, ""),
            ("7b0c5a1e-0d5e-4c59-9d1c-1f0f3b0a9e02", "Desk lamp", 800, Category::Furniture, "\"https://images.example.com/lamp.png\""),
        ]
        .into_iter()
        .map(|(id, title, price, category, image)| {
            let draft = ListingDraft::new(title, "Good condition", Price::new(price), category, "room 12")
                .expect("draft");
            Listing::from_parts(
                ListingId::parse(id).expect("listing id"),
                at,
                NewListing::new(draft, ImageRef::from_stored(image), &owner),
            )
        })
        .collect()
    }

    #[rstest]
    fn filter_frames_parse_with_partial_fields() {
        let frame = r#"{"type":"filter","category":"Furniture","maxPrice":900,"dragged":"max"}"#;
        let ClientMessage::Filter(query) = serde_json::from_str(frame).expect("filter frame");
        assert_eq!(query.category.as_deref(), Some("Furniture"));
        assert_eq!(query.max_price, Some(900));
        assert_eq!(query.search, None);
    }

    #[rstest]
    fn unknown_frames_are_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe"}"#).is_err());
    }

    #[rstest]
    fn index_snapshot_carries_the_applied_filter(listings: Vec<Listing>) {
        let query = IndexQuery {
            search: Some("lamp".to_owned()),
            ..IndexQuery::default()
        };
        let filter = filter_for(&query, &listings).expect("filter");
        assert_json_snapshot!(ServerMessage::filtered(&listings, &filter), @r#"
        {
          "type": "snapshot",
          "view": "index",
          "listings": [
            {
              "id": "7b0c5a1e-0d5e-4c59-9d1c-1f0f3b0a9e02",
              "title": "Desk lamp",
              "description": "Good condition",
              "price": 800,
              "category": "Furniture",
              "contact": "room 12",
              "image": "\"https://images.example.com/lamp.png\"",
              "owner": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
              "ownerName": "Rafi",
              "createdAt": "2025-03-01T09:30:00Z",
              "imageUrl": "https://images.example.com/lamp.png",
              "sellerName": "Rafi",
              "currency": "BDT"
            }
          ],
          "filter": {
            "category": "All",
            "minPrice": 0,
            "maxPrice": 1200,
            "search": "lamp",
            "highestPrice": 1200
          },
          "total": 2
        }
        "#);
    }

    #[rstest]
    fn unfiltered_snapshot_uses_the_placeholder(listings: Vec<Listing>) {
        let first = listings.into_iter().take(1).collect();
        assert_json_snapshot!(ServerMessage::snapshot(FeedView::Item, first), @r#"
        {
          "type": "snapshot",
          "view": "item",
          "listings": [
            {
              "id": "7b0c5a1e-0d5e-4c59-9d1c-1f0f3b0a9e01",
              "title": "Phone case",
              "description": "Good condition",
              "price": 1200,
              "category": "Electronics",
              "contact": "room 12",
              "image": "",
              "owner": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
              "ownerName": "Rafi",
              "createdAt": "2025-03-01T09:30:00Z",
              "imageUrl": "/images/placeholder.png",
              "sellerName": "Rafi",
              "currency": "BDT"
            }
          ],
          "total": 1
        }
        "#);
    }

    #[rstest]
    fn errors_and_missing_items_are_tagged() {
        let id = ListingId::parse("7b0c5a1e-0d5e-4c59-9d1c-1f0f3b0a9e01").expect("id");
        assert_json_snapshot!(ServerMessage::NotFound { id }, @r#"
        {
          "type": "notFound",
          "id": "7b0c5a1e-0d5e-4c59-9d1c-1f0f3b0a9e01"
        }
        "#);
        let internal = Error::internal("disk on fire");
        assert_json_snapshot!(ServerMessage::error(&internal), @r#"
        {
          "type": "error",
          "code": "internal_error",
          "message": "Internal server error"
        }
        "#);
    }
}
