//! HTTP adapter mapping for domain errors.
//!
//! Keeps [`crate::domain::Error`] HTTP-agnostic while letting Actix handlers
//! turn domain failures into JSON bodies with matching status codes.
//! Backend messages pass through untouched; only internal errors are
//! replaced with a generic message.

use actix_web::http::header::{HeaderValue, RETRY_AFTER};
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Seconds a client should wait before retrying an unavailable resource.
pub const RETRY_AFTER_SECS: u32 = 1;

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Copy of `error` safe to show a client.
///
/// Internal errors lose their message and details but keep the trace id so
/// the report can still be matched against the logs.
pub(crate) fn redact_if_internal(error: &Error) -> Error {
    if error.code() != ErrorCode::InternalError {
        return error.clone();
    }
    let redacted = Error::internal("Internal server error");
    match error.trace_id() {
        Some(id) => redacted.with_trace_id(id.to_owned()),
        None => redacted,
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let body = redact_if_internal(self);
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = body.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        // Session lookups and backend quotas recover quickly; invite a retry.
        if self.code() == ErrorCode::ServiceUnavailable {
            builder.insert_header((RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS)));
        }
        builder.json(body)
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "framework error surfaced as internal error");
        Error::internal("Internal server error")
    }
}
