//! Sign-in and sign-up payloads.
//!
//! Inbound adapters turn raw strings into these types before talking to the
//! account port, so the identity provider only ever sees well-formed input.

use zeroize::Zeroizing;

use super::{DisplayName, EmailAddress, UserValidationError};

/// Minimum password length accepted at sign-up.
pub const PASSWORD_MIN_LEN: usize = 6;

/// Validation failures for sign-in and sign-up payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsValidationError {
    #[error(transparent)]
    Identity(#[from] UserValidationError),
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("password should be at least {min} characters")]
    WeakPassword { min: usize },
}

impl CredentialsValidationError {
    /// Form field the failure belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Identity(
                UserValidationError::EmptyDisplayName
                | UserValidationError::DisplayNameTooLong { .. }
                | UserValidationError::DisplayNameControlCharacters,
            ) => "displayName",
            Self::Identity(_) => "email",
            Self::EmptyPassword | Self::WeakPassword { .. } => "password",
        }
    }
}

/// Validated sign-in credentials.
///
/// # Examples
/// ```
/// use marketplace::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@Example.com", "hunter22").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Validate raw sign-in input. The password keeps caller whitespace.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = EmailAddress::new(email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password as supplied.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    display_name: Option<DisplayName>,
    credentials: LoginCredentials,
}

impl Registration {
    /// Validate raw sign-up input.
    pub fn try_from_parts(
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, CredentialsValidationError> {
        let display_name = if display_name.trim().is_empty() {
            None
        } else {
            Some(DisplayName::new(display_name)?)
        };
        let credentials = LoginCredentials::try_from_parts(email, password)?;
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(CredentialsValidationError::WeakPassword {
                min: PASSWORD_MIN_LEN,
            });
        }
        Ok(Self {
            display_name,
            credentials,
        })
    }

    /// Name to set on the new identity; `None` keeps the provider's default.
    pub fn display_name(&self) -> Option<&DisplayName> {
        self.display_name.as_ref()
    }

    /// Credentials for the new identity.
    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }
}
