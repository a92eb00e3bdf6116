//! Account identity types: user ids, display names and email addresses.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors for user identity values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must not be empty")]
    EmptyId,
    #[error("user id must be a valid UUID")]
    InvalidId,
    #[error("display name must not be empty")]
    EmptyDisplayName,
    #[error("display name must be at most {max} characters")]
    DisplayNameTooLong { max: usize },
    #[error("display name must not contain control characters")]
    DisplayNameControlCharacters,
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("email address is badly formatted")]
    InvalidEmail,
}

/// Stable user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum display name length in characters.
pub const DISPLAY_NAME_MAX: usize = 64;

/// Name shown on listings as the seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Trim and validate a display name.
    pub fn new(display_name: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = display_name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        if trimmed.chars().any(char::is_control) {
            return Err(UserValidationError::DisplayNameControlCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Sign-in email address, normalised to lower case.
///
/// Only the shape is checked: one `@`, a non-empty local part and a domain
/// containing a dot. Deliverability is the identity provider's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = email.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        let mut parts = trimmed.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(UserValidationError::InvalidEmail);
        };
        let domain_ok = domain
            .split_once('.')
            .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty());
        if local.is_empty() || !domain_ok || trimmed.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_lowercase()))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Signed-in account as seen by the rest of the application.
///
/// ## Invariants
/// - `id` is the identity provider's UUID.
/// - `display_name` is captured onto listings at creation time and not
///   re-validated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    display_name: DisplayName,
    email: EmailAddress,
}

impl User {
    /// Build a user from validated parts.
    pub fn new(id: UserId, display_name: DisplayName, email: EmailAddress) -> Self {
        Self {
            id,
            display_name,
            email,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Seller name shown on listings.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Sign-in email.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }
}
