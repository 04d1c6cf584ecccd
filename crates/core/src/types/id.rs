//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.
//!
//! IDs are strings in canonical form. Upstream payloads sometimes carry
//! numeric identifiers, so deserialization accepts either a JSON string or a
//! JSON number and normalizes numbers to their decimal string form.

use serde::Deserializer;
use serde::de::{self, Visitor};

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` as a plain string
/// - `Deserialize` from a string or a number (normalized to a string)
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<&str>`, `From<String>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use storefront_sync_core::define_id;
/// define_id!(UserId);
/// define_id!(OrderId);
///
/// let user_id = UserId::new("1");
/// let order_id = OrderId::new("1");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the canonical string form.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                $crate::types::id::deserialize_canonical_id(deserializer).map(Self)
            }
        }
    };
}

define_id!(ProductId);
define_id!(UserId);

/// Deserialize an identifier given either as a string or as a number.
///
/// Used by [`define_id!`]; numbers are rendered with their `Display` form so
/// `7` and `"7"` produce the same ID.
///
/// # Errors
///
/// Returns the deserializer's error for anything other than a string or a
/// number.
pub fn deserialize_canonical_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(CanonicalIdVisitor)
}

struct CanonicalIdVisitor;

impl Visitor<'_> for CanonicalIdVisitor {
    type Value = String;

    fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("a string or numeric identifier")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_is_normalized() {
        let id: ProductId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");
        assert_eq!(id, ProductId::new("42"));
    }

    #[test]
    fn test_string_id_is_kept() {
        let id: ProductId = serde_json::from_str("\"p-1\"").unwrap();
        assert_eq!(id.as_str(), "p-1");
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&UserId::new("1700000000000")).unwrap();
        assert_eq!(json, "\"1700000000000\"");
    }

    #[test]
    fn test_rejects_non_scalar() {
        assert!(serde_json::from_str::<ProductId>("[1]").is_err());
        assert!(serde_json::from_str::<ProductId>("null").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ProductId::from("p1")), "p1");
    }
}
