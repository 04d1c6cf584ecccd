//! Storefront state synchronization.
//!
//! Catalog, cart and identity stores sharing one persistence gateway, wired
//! together by [`state::Storefront`]. This crate provides the stores as a
//! library so the CLI and the integration tests drive the same code.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod models;
pub mod persistence;
pub mod remote;
pub mod state;
pub mod stores;

pub use state::Storefront;
