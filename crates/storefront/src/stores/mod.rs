//! The three stores and their wiring order.
//!
//! Catalog is a leaf. Cart reads the catalog through [`CatalogLookup`](storefront_sync_core::CatalogLookup).
//! Identity drives the cart's persistence scope.

pub mod cart;
pub mod catalog;
pub mod identity;

pub use cart::CartStore;
pub use catalog::{CatalogError, CatalogStore};
pub use identity::{AuthError, HydrationHandle, IdentityStore};
