//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::test;
use serde_json::Value;

/// Cookie name used by [`test_session_middleware`].
pub const TEST_SESSION_COOKIE: &str = "session";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name(TEST_SESSION_COOKIE.to_owned())
        .cookie_secure(false)
        .build()
}

/// Session cookie set by a response.
pub fn session_cookie(res: &ServiceResponse) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == TEST_SESSION_COOKIE)
        .expect("session cookie")
        .into_owned()
}

/// Read the body as JSON.
pub async fn json_body(res: ServiceResponse) -> Value {
    let body = test::read_body(res).await;
    serde_json::from_slice(&body).expect("json body")
}
