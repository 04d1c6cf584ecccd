//! Catalog product types.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::{Discount, Price};

/// A purchasable product.
///
/// Field names follow the upstream `products.json` payload (camelCase).
/// Identifiers arriving as JSON numbers are normalized to strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub discount: Discount,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Product {
    /// Price after applying the product's discount.
    #[must_use]
    pub fn final_price(&self) -> Price {
        self.price.discounted(self.discount)
    }

    /// Build a product from a creation request and an assigned id.
    #[must_use]
    pub fn from_new(id: ProductId, new: NewProduct) -> Self {
        Self {
            id,
            name: new.name,
            price: new.price,
            discount: new.discount,
            active: new.active,
            cover_image: new.cover_image,
            images: new.images,
            category: new.category,
            description: new.description,
        }
    }

    /// Merge a partial update into this product. The id never changes.
    pub fn apply(&mut self, update: ProductUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(discount) = update.discount {
            self.discount = discount;
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        if let Some(cover_image) = update.cover_image {
            self.cover_image = cover_image;
        }
        if let Some(images) = update.images {
            self.images = images;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
    }
}

/// A product together with its post-discount price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedProduct {
    #[serde(flatten)]
    pub product: Product,
    pub final_price: Price,
}

impl From<Product> for PricedProduct {
    fn from(product: Product) -> Self {
        let final_price = product.final_price();
        Self {
            product,
            final_price,
        }
    }
}

/// Product creation request (the catalog assigns the id).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub discount: Discount,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial product update. `None` leaves a field unchanged; for the optional
/// fields, `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Price>,
    pub discount: Option<Discount>,
    pub active: Option<bool>,
    pub cover_image: Option<String>,
    pub images: Option<Vec<String>>,
    pub category: Option<Option<String>>,
    pub description: Option<Option<String>>,
}
