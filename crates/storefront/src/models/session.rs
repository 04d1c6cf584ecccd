//! Session-related types.
//!
//! Types persisted for authentication state.

use serde::{Deserialize, Serialize};

use storefront_sync_core::{Email, UserId};

/// Identity of the signed-in user.
///
/// Persisted as JSON under [`keys::USER`](crate::persistence::keys::USER)
/// while the session is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User ID; also names the user's cart snapshot.
    pub id: UserId,
    /// Display name given at login or registration.
    pub username: String,
    /// User's email address.
    pub email: Email,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_form() {
        let user = CurrentUser {
            id: UserId::new("1"),
            username: "bob".to_string(),
            email: Email::for_username("bob"),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(json, r#"{"id":"1","username":"bob","email":"bob@example.com"}"#);
        assert_eq!(serde_json::from_str::<CurrentUser>(&json).unwrap(), user);
    }
}
