//! Command implementations.
//!
//! Each command prints one JSON document on stdout. Action failures are
//! printed as `{"success": false, "error": ...}` and then reported as
//! [`CliError::ActionFailed`] so the process exits non-zero.

pub mod auth;
pub mod cart;
pub mod catalog;

use serde::Serialize;
use thiserror::Error;

use storefront_sync::error::ActionResult;
use storefront_sync::persistence::StorageError;
use storefront_sync_core::PriceError;

/// Errors that end a CLI invocation.
#[derive(Debug, Error)]
pub enum CliError {
    /// The storage file could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Output could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A price or discount argument was out of range.
    #[error("Invalid argument: {0}")]
    Price(#[from] PriceError),

    /// The action ran and reported a failure.
    #[error("{0}")]
    ActionFailed(String),
}

/// Print a value as pretty JSON on stdout.
#[allow(clippy::print_stdout)]
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an action result, turning a failure into an error.
pub fn report<T: Serialize>(result: ActionResult<T>) -> Result<(), CliError> {
    print_json(&result)?;
    match result.error {
        Some(error) if !result.success => Err(CliError::ActionFailed(error)),
        _ => Ok(()),
    }
}
