//! Storefront Sync Core - Shared types library.
//!
//! This crate provides the types used across all storefront-sync components:
//! - `storefront-sync` - Catalog, cart and identity stores
//! - `storefront-sync-cli` - Command-line driver for the stores
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure functions - no I/O,
//! no persistence, no HTTP clients. Cart totals and catalog queries live here
//! so they can be tested without any store around them.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, emails, passwords, products, carts and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
