//! Cart commands.
//!
//! Every command prints the resulting cart with totals priced against a
//! freshly fetched catalog. A failed fetch leaves prices at zero.

use serde::Serialize;

use storefront_sync::Storefront;
use storefront_sync::error::ActionResult;
use storefront_sync_core::{CartLineDetails, CartTotals, HydrationStatus, ProductId};

use super::{CliError, report};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CartView {
    scope: String,
    hydration: HydrationStatus,
    items: Vec<CartLineDetails>,
    item_count: u64,
    #[serde(flatten)]
    totals: CartTotals,
}

async fn view(app: &Storefront) -> ActionResult<CartView> {
    app.catalog().refresh().await;
    let cart = app.cart();
    ActionResult::ok(CartView {
        scope: cart.scope().to_string(),
        hydration: cart.hydration_status(),
        items: cart.cart_items_with_details(),
        item_count: cart.item_count(),
        totals: cart.totals(),
    })
}

/// Print the cart.
pub async fn show(app: &Storefront) -> Result<(), CliError> {
    report(view(app).await)
}

/// Add one of a product, naming the line after the catalog entry when no name is given.
pub async fn add(app: &Storefront, id: &str, name: Option<String>) -> Result<(), CliError> {
    app.catalog().refresh().await;
    let id = ProductId::new(id);
    let name = name
        .or_else(|| app.catalog().product_by_id(&id).map(|p| p.name))
        .unwrap_or_else(|| id.to_string());
    app.cart().add_to_cart(&id, &name);
    report(view(app).await)
}

/// Remove one of a product.
pub async fn decrease(app: &Storefront, id: &str) -> Result<(), CliError> {
    app.cart().decrease_from_cart(&ProductId::new(id));
    report(view(app).await)
}

/// Remove a product's line.
pub async fn remove(app: &Storefront, id: &str) -> Result<(), CliError> {
    app.cart().remove_from_cart(&ProductId::new(id));
    report(view(app).await)
}

/// Set a line's quantity.
pub async fn set(app: &Storefront, id: &str, count: i64) -> Result<(), CliError> {
    app.cart().update_quantity(&ProductId::new(id), count);
    report(view(app).await)
}

/// Empty the cart.
pub async fn clear(app: &Storefront) -> Result<(), CliError> {
    app.cart().clear_cart();
    report(view(app).await)
}
