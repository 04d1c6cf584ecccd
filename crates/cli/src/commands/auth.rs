//! Session commands.

use serde::Serialize;

use storefront_sync::Storefront;
use storefront_sync::error::ActionResult;
use storefront_sync::models::CurrentUser;
use storefront_sync_core::{HydrationStatus, SessionStatus};

use super::{CliError, report};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    status: SessionStatus,
    user: Option<CurrentUser>,
    cart_scope: String,
    cart_hydration: HydrationStatus,
    cart_item_count: u64,
}

/// Sign in and load the user's saved cart.
pub async fn login(app: &Storefront, username: &str, password: &str) -> Result<(), CliError> {
    let result = app.identity().login(username, password).await;
    report(ActionResult::<CurrentUser>::from(result))
}

/// Create an account and sign in.
pub async fn register(
    app: &Storefront,
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), CliError> {
    let result = app.identity().register(username, email, password).await;
    report(ActionResult::<CurrentUser>::from(result))
}

/// Save the cart for the current user and sign out.
pub async fn logout(app: &Storefront) -> Result<(), CliError> {
    app.identity().logout().await;
    report(ActionResult::ok(()))
}

/// Describe the restored session.
pub fn status(app: &Storefront) -> Result<(), CliError> {
    let identity = app.identity();
    let cart = app.cart();
    report(ActionResult::ok(SessionView {
        status: identity.status(),
        user: identity.user(),
        cart_scope: cart.scope().to_string(),
        cart_hydration: cart.hydration_status(),
        cart_item_count: cart.item_count(),
    }))
}
