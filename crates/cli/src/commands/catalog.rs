//! Catalog commands.
//!
//! The catalog is fetched fresh on every invocation. Administration changes
//! apply to that fetched copy only and are gone when the process exits.

use rust_decimal::Decimal;
use serde::Serialize;

use storefront_sync::Storefront;
use storefront_sync::error::ActionResult;
use storefront_sync::stores::CatalogError;
use storefront_sync_core::{
    Catalog, Discount, NewProduct, Price, Product, ProductId, ProductUpdate, SortOrder,
};

use super::{CliError, report};

/// Filters for `catalog list`, applied in declaration order.
pub struct ListFilter {
    pub category: Option<String>,
    pub active: bool,
    pub discounted: bool,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub sort: Option<SortOrder>,
}

/// Field changes for `catalog update`.
pub struct Changes {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub active: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    total_products: usize,
    active_products: usize,
    average_price: Decimal,
    max_discount: Discount,
    categories: Vec<String>,
}

/// Refresh the catalog, returning the failure message if it could not be fetched.
async fn refresh(app: &Storefront) -> Result<(), String> {
    app.catalog().refresh().await;
    app.catalog().error().map_or(Ok(()), Err)
}

/// List products with final prices.
pub async fn list(app: &Storefront, filter: ListFilter) -> Result<(), CliError> {
    if let Err(e) = refresh(app).await {
        return report::<()>(ActionResult::failure(e));
    }

    app.catalog().set_category(filter.category);
    let mut products = Catalog::new(app.catalog().products_by_category());
    if filter.active {
        products = Catalog::new(products.active());
    }
    if filter.discounted {
        products = Catalog::new(products.discounted());
    }
    if filter.min.is_some() || filter.max.is_some() {
        let min = Price::new(filter.min.unwrap_or(Decimal::ZERO))?;
        let max = Price::new(filter.max.unwrap_or(Decimal::MAX))?;
        products = Catalog::new(products.in_price_range(min, max));
    }
    if let Some(order) = filter.sort {
        products = Catalog::new(products.sorted_by_price(order));
    }

    report(ActionResult::ok(products.with_final_price()))
}

/// Case-insensitive name search.
pub async fn search(app: &Storefront, query: &str) -> Result<(), CliError> {
    if let Err(e) = refresh(app).await {
        return report::<()>(ActionResult::failure(e));
    }
    let matches = Catalog::new(app.catalog().search_products(query));
    report(ActionResult::ok(matches.with_final_price()))
}

/// Show a single product.
pub async fn show(app: &Storefront, id: &str) -> Result<(), CliError> {
    if let Err(e) = refresh(app).await {
        return report::<()>(ActionResult::failure(e));
    }
    let id = ProductId::new(id);
    let product = app
        .catalog()
        .product_by_id(&id)
        .ok_or(CatalogError::NotFound(id));
    report(ActionResult::<Product>::from(product))
}

/// Summary figures for the whole catalog.
pub async fn stats(app: &Storefront) -> Result<(), CliError> {
    if let Err(e) = refresh(app).await {
        return report::<()>(ActionResult::failure(e));
    }
    let catalog = app.catalog();
    report(ActionResult::ok(Stats {
        total_products: catalog.total_products(),
        active_products: catalog.active_products_count(),
        average_price: catalog.average_price(),
        max_discount: catalog.max_discount(),
        categories: catalog.available_categories(),
    }))
}

/// Add a product to the fetched catalog.
pub async fn add(
    app: &Storefront,
    name: String,
    price: Decimal,
    discount: Decimal,
    category: Option<String>,
    active: bool,
) -> Result<(), CliError> {
    let product = NewProduct {
        name,
        price: Price::new(price)?,
        discount: Discount::new(discount)?,
        active,
        cover_image: String::new(),
        images: Vec::new(),
        category,
        description: None,
    };
    if let Err(e) = refresh(app).await {
        return report::<()>(ActionResult::failure(e));
    }
    let added = app.catalog().add_product(product).await;
    report(ActionResult::<Product>::from(added))
}

/// Merge field changes into a product.
pub async fn update(app: &Storefront, id: &str, changes: Changes) -> Result<(), CliError> {
    let update = ProductUpdate {
        name: changes.name,
        price: changes.price.map(Price::new).transpose()?,
        discount: changes.discount.map(Discount::new).transpose()?,
        active: changes.active,
        ..ProductUpdate::default()
    };
    if let Err(e) = refresh(app).await {
        return report::<()>(ActionResult::failure(e));
    }
    let updated = app.catalog().update_product(&ProductId::new(id), update).await;
    report(ActionResult::<Product>::from(updated))
}

/// Delete a product.
pub async fn delete(app: &Storefront, id: &str) -> Result<(), CliError> {
    if let Err(e) = refresh(app).await {
        return report::<()>(ActionResult::failure(e));
    }
    let deleted = app.catalog().delete_product(&ProductId::new(id)).await;
    report(ActionResult::<()>::from(deleted))
}
