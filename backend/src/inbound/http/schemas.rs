//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.
//!
//! The schema wrappers mirror the wire shape of their corresponding domain
//! types but live in the inbound adapter layer where framework concerns belong.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// A backing service is not ready; retry shortly.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// API error response payload with machine-readable code and human-readable
/// message.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "Please add an image or URL")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary error details for clients, such as the offending field.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::User`].
#[derive(ToSchema)]
#[schema(as = crate::domain::User)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct UserSchema {
    /// Stable user identifier.
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: String,
    /// Seller name shown on listings.
    #[schema(value_type = String, example = "Nadia Rahman")]
    display_name: String,
    /// Sign-in email address.
    #[schema(value_type = String, example = "nadia@example.com")]
    email: String,
}

/// OpenAPI schema for [`crate::domain::Category`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Category)]
pub enum CategorySchema {
    Electronics,
    Books,
    Furniture,
    Clothing,
    Other,
}

/// OpenAPI schema for [`crate::domain::Listing`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Listing)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ListingSchema {
    /// Store-assigned identifier.
    #[schema(value_type = String, example = "0b6a3f7e-94c5-4b63-9f0e-3c1f1e1c2a10")]
    id: String,
    #[schema(example = "Phone")]
    title: String,
    description: String,
    /// Whole amount in BDT.
    #[schema(example = 500)]
    price: u64,
    category: CategorySchema,
    /// How to reach the seller.
    contact: String,
    /// Image URL; may be empty for legacy records.
    #[schema(example = "http://localhost:8080/media/products/example.png")]
    image: String,
    /// Owner's user id.
    #[schema(value_type = String)]
    owner: String,
    /// Owner's display name at creation time.
    owner_name: String,
    /// Store-assigned creation time.
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::PartialSchema;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[rstest]
    fn error_code_schema_variants_match_domain() {
        let schema_json = schema_to_json::<ErrorCodeSchema>();
        // utoipa replaces :: with . in schema names
        assert_eq!(ErrorCodeSchema::name(), "crate.domain.ErrorCode");
        for code in [
            "invalid_request",
            "unauthorized",
            "forbidden",
            "not_found",
            "service_unavailable",
            "internal_error",
        ] {
            assert!(schema_json.contains(code), "missing {code}");
        }
    }

    #[rstest]
    fn error_schema_uses_wire_field_names() {
        let schema_json = schema_to_json::<ErrorSchema>();
        assert_eq!(ErrorSchema::name(), "crate.domain.Error");
        assert!(schema_json.contains("traceId"), "{schema_json}");
        assert!(!schema_json.contains("trace_id"), "{schema_json}");
    }

    #[rstest]
    fn listing_schema_lists_every_category() {
        let schema_json = schema_to_json::<CategorySchema>();
        for category in crate::domain::Category::ALL {
            assert!(schema_json.contains(category.as_str()), "missing {category}");
        }
        let listing_json = schema_to_json::<ListingSchema>();
        assert!(listing_json.contains("ownerName"), "{listing_json}");
        assert!(listing_json.contains("createdAt"), "{listing_json}");
    }
}
