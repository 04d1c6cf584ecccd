//! Status enums shared by the stores.

use serde::{Deserialize, Serialize};

/// Authentication state of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Anonymous,
    Authenticated,
}

/// Outcome of the most recent attempt to hydrate a cart from persistence.
///
/// Background hydration never surfaces errors to its caller, so this is the
/// only way to tell "nothing was saved" apart from "loading failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HydrationStatus {
    /// No hydration has been attempted since the store was created.
    #[default]
    Unknown,
    /// A hydration is in flight.
    Pending,
    /// A saved snapshot was found and loaded.
    Loaded,
    /// No snapshot exists for the requested scope.
    NothingSaved,
    /// The snapshot could not be read or decoded; the cart was left as-is.
    Failed,
}

/// Direction for price-ordered catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(format!("invalid sort order: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_round_trip() {
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Descending);
        assert_eq!(SortOrder::Ascending.to_string(), "asc");
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
