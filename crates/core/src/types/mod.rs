//! Core types for storefront-sync.
//!
//! This module provides type-safe wrappers for common domain concepts and the
//! pure cart and catalog logic the stores are built on.

pub mod cart;
pub mod catalog;
pub mod credential;
pub mod email;
pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use cart::{Cart, CartLine, CartLineDetails, CartTotals};
pub use catalog::{Catalog, CatalogLookup};
pub use credential::{MIN_PASSWORD_LENGTH, PasswordError, validate_password};
pub use email::{Email, EmailError};
pub use id::{ProductId, UserId};
pub use price::{Discount, Price, PriceError};
pub use product::{NewProduct, PricedProduct, Product, ProductUpdate};
pub use status::*;
