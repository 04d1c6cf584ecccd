//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input does not contain an @ symbol.
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
}

/// An email address.
///
/// Validation is deliberately shallow: the storefront only requires the
/// address to contain an `@`. Deliverability is not checked.
///
/// ## Constraints
///
/// - Must not be empty
/// - Must contain an @ symbol
///
/// ## Examples
///
/// ```
/// use storefront_sync_core::Email;
///
/// assert!(Email::parse("alice@x.com").is_ok());
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("no-at-symbol").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or does not contain an @ symbol.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        if !s.contains('@') {
            return Err(EmailError::MissingAtSymbol);
        }

        Ok(Self(s.to_owned()))
    }

    /// Build the placeholder address used for test identities
    /// (`<username>@example.com`). Always contains an `@`, so it needs no
    /// validation.
    #[must_use]
    pub fn for_username(username: &str) -> Self {
        Self(format!("{username}@example.com"))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
