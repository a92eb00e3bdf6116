//! Cache policy for per-user views.

/// Views depend on the session cookie, so shared caches must not keep them.
pub const PRIVATE_NO_CACHE: &str = "private, no-cache, must-revalidate";

/// `Cache-Control` header pair for session-dependent responses.
pub const fn private_no_cache_header() -> (&'static str, &'static str) {
    ("Cache-Control", PRIVATE_NO_CACHE)
}
