//! Credential validation.
//!
//! Passwords are checked for length only and never retained: no store keeps
//! or forwards the raw text once a login or registration has been validated.

/// Minimum password length, counted in characters.
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Errors that can occur when validating a password.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Fewer characters than [`MIN_PASSWORD_LENGTH`].
    #[error("password must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
}

/// Check a candidate password supplied at login or registration.
///
/// # Errors
///
/// Returns `PasswordError::TooShort` if the password has fewer than
/// [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}
