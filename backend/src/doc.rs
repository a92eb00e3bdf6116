//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: the `/api/v1` actions (accounts, listings) and health probes
//! - **Schemas**: wrappers ([`ErrorSchema`], [`ErrorCodeSchema`],
//!   [`UserSchema`], [`ListingSchema`], [`CategorySchema`]) that describe
//!   domain types without coupling them to utoipa
//! - **Security**: Session cookie authentication scheme
//!
//! Page views and the live feed are not part of the document; they answer
//! with view envelopes and WebSocket frames rather than REST resources.

use crate::inbound::http::schemas::{
    CategorySchema, ErrorCodeSchema, ErrorSchema, ListingSchema, UserSchema,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "marketplace_session",
                "Session cookie issued by POST /api/v1/login or /api/v1/register.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Marketplace API",
        description = "Accounts, listing actions and health probes for the campus marketplace."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_session,
        crate::inbound::http::listings::create_listing,
        crate::inbound::http::listings::delete_listing,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        UserSchema,
        ListingSchema,
        CategorySchema,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "users", description = "Registration and sessions"),
        (name = "listings", description = "Posting and removing items"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
