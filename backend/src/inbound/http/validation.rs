//! Shared validation helpers for inbound HTTP adapters.

use serde_json::json;

use crate::domain::{CredentialsValidationError, Error, ListingId};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidBase64,
    UploadTooLarge,
    InvalidCredentials,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidBase64 => "invalid_base64",
            ErrorCode::UploadTooLarge => "upload_too_large",
            ErrorCode::InvalidCredentials => "invalid_credentials",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    fn new(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field: field.as_str(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    ValidationError::new(field, format!("{} must be a valid UUID", field.as_str()))
        .with_value(ErrorCode::InvalidUuid, value)
}

/// Parse a listing id taken from a path segment.
pub(crate) fn parse_listing_id(value: &str, field: FieldName) -> Result<ListingId, Error> {
    ListingId::parse(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn invalid_base64_error(field: FieldName) -> Error {
    ValidationError::new(field, format!("{} must be base64 encoded", field.as_str()))
        .with_code(ErrorCode::InvalidBase64)
}

pub(crate) fn upload_too_large_error(field: FieldName, limit: usize) -> Error {
    Error::invalid_request(format!("image must be at most {limit} bytes")).with_details(json!({
        "field": field.as_str(),
        "limit": limit,
        "code": ErrorCode::UploadTooLarge.as_str(),
    }))
}

/// Map sign-in/sign-up validation failures onto the offending form field.
pub(crate) fn credentials_error(err: &CredentialsValidationError) -> Error {
    ValidationError {
        field: err.field(),
        message: err.to_string(),
    }
    .with_code(ErrorCode::InvalidCredentials)
}
