//! Persistence gateway: a synchronous key-value contract shared by all stores.
//!
//! # Keys
//!
//! - `user` - JSON-encoded [`CurrentUser`](crate::models::CurrentUser)
//! - `isAuthenticated` - `"true"` while a session is active
//! - `cart:anonymous` - cart snapshot for the anonymous session
//! - `cart_<userId>` - cart snapshot for a signed-in user
//!
//! Cart snapshots are always keyed by [`CartScope`]. The anonymous sentinel
//! cannot collide with a per-user key because it does not share the `cart_`
//! prefix.
//!
//! There is no locking or transaction discipline: concurrent writers to the
//! same key are last-write-wins.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::fmt;

use thiserror::Error;

use storefront_sync_core::UserId;

/// Errors a gateway may report from a write.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium could not be written.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded.
    #[error("storage encoding error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The gateway refused the write.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous key-value storage.
///
/// Reads are total: anything unreadable is reported as absent. Writes may
/// fail, and callers decide per key whether a failure matters.
pub trait PersistenceGateway: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value could not be stored.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium could not be updated.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Fixed persistence keys.
pub mod keys {
    /// Key for the serialized current user.
    pub const USER: &str = "user";

    /// Key for the authenticated flag.
    pub const IS_AUTHENTICATED: &str = "isAuthenticated";

    /// Key for the anonymous session's cart snapshot.
    pub const ANONYMOUS_CART: &str = "cart:anonymous";

    /// Prefix for per-user cart snapshots.
    pub const USER_CART_PREFIX: &str = "cart_";
}

/// The session identity a cart snapshot belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CartScope {
    #[default]
    Anonymous,
    User(UserId),
}

impl CartScope {
    /// Persistence key for this scope's cart snapshot.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Anonymous => keys::ANONYMOUS_CART.to_string(),
            Self::User(id) => format!("{}{id}", keys::USER_CART_PREFIX),
        }
    }
}

impl fmt::Display for CartScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

impl From<UserId> for CartScope {
    fn from(id: UserId) -> Self {
        Self::User(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_keys() {
        assert_eq!(CartScope::Anonymous.key(), "cart:anonymous");
        assert_eq!(CartScope::User(UserId::new("1")).key(), "cart_1");
    }

    #[test]
    fn test_anonymous_key_never_matches_user_prefix() {
        assert!(!CartScope::Anonymous.key().starts_with(keys::USER_CART_PREFIX));
        assert_ne!(
            CartScope::Anonymous.key(),
            CartScope::User(UserId::new("anonymous")).key()
        );
    }
}
