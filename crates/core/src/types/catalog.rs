//! Catalog snapshot and its derived queries.
//!
//! Every query on [`Catalog`] is a pure function of the current product list.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::{Discount, Price};
use super::product::{PricedProduct, Product, ProductUpdate};
use super::status::SortOrder;

/// Read-only product lookup used to price cart lines.
///
/// Implemented by [`Catalog`] and by the live catalog store, so cart logic
/// can be exercised against a fixed product list in tests.
pub trait CatalogLookup: Send + Sync {
    /// Find a product by id.
    fn product(&self, id: &ProductId) -> Option<Product>;
}

/// A snapshot of the product collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Create a catalog from a product list.
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// All products, in upstream order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Append a product.
    pub fn insert(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Merge `update` into the product with `id`, returning the result.
    pub fn update(&mut self, id: &ProductId, update: ProductUpdate) -> Option<&Product> {
        let product = self.products.iter_mut().find(|p| &p.id == id)?;
        product.apply(update);
        Some(product)
    }

    /// Remove the product with `id`, returning it if it existed.
    pub fn remove(&mut self, id: &ProductId) -> Option<Product> {
        let index = self.products.iter().position(|p| &p.id == id)?;
        Some(self.products.remove(index))
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Products flagged active.
    #[must_use]
    pub fn active(&self) -> Vec<Product> {
        self.filtered(|p| p.active)
    }

    /// Products with a non-zero discount.
    #[must_use]
    pub fn discounted(&self) -> Vec<Product> {
        self.filtered(|p| p.discount.is_discounted())
    }

    /// Products in `category`; every product when `category` is `None`.
    #[must_use]
    pub fn by_category(&self, category: Option<&str>) -> Vec<Product> {
        match category {
            None => self.products.clone(),
            Some(category) => self.filtered(|p| p.category.as_deref() == Some(category)),
        }
    }

    /// Mean price, or zero for an empty catalog.
    ///
    /// Prices whose sum would overflow are averaged term by term instead.
    #[must_use]
    pub fn average_price(&self) -> Decimal {
        if self.products.is_empty() {
            return Decimal::ZERO;
        }
        let count = Decimal::from(self.products.len());
        let prices = self.products.iter().map(|p| p.price.amount());
        prices.clone().try_fold(Decimal::ZERO, Decimal::checked_add).map_or_else(
            || prices.fold(Decimal::ZERO, |mean, price| mean.saturating_add(price / count)),
            |total| total / count,
        )
    }

    /// Largest discount, or none for an empty catalog.
    #[must_use]
    pub fn max_discount(&self) -> Discount {
        self.products
            .iter()
            .map(|p| p.discount)
            .max()
            .unwrap_or(Discount::NONE)
    }

    /// Distinct categories in order of first appearance.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.products
            .iter()
            .filter_map(|p| p.category.as_deref())
            .filter(|c| seen.insert(*c))
            .map(str::to_owned)
            .collect()
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Case-insensitive substring search on product names.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Product> {
        let query = query.to_lowercase();
        self.filtered(|p| p.name.to_lowercase().contains(&query))
    }

    /// Copy of the collection ordered by price. Ties keep upstream order.
    #[must_use]
    pub fn sorted_by_price(&self, order: SortOrder) -> Vec<Product> {
        let mut products = self.products.clone();
        match order {
            SortOrder::Ascending => products.sort_by(|a, b| a.price.cmp(&b.price)),
            SortOrder::Descending => products.sort_by(|a, b| b.price.cmp(&a.price)),
        }
        products
    }

    /// Every product paired with its post-discount price.
    #[must_use]
    pub fn with_final_price(&self) -> Vec<PricedProduct> {
        self.products.iter().cloned().map(PricedProduct::from).collect()
    }

    /// Products priced within `min..=max`.
    #[must_use]
    pub fn in_price_range(&self, min: Price, max: Price) -> Vec<Product> {
        self.filtered(|p| p.price >= min && p.price <= max)
    }

    fn filtered(&self, predicate: impl Fn(&Product) -> bool) -> Vec<Product> {
        self.products.iter().filter(|p| predicate(p)).cloned().collect()
    }
}

impl CatalogLookup for Catalog {
    fn product(&self, id: &ProductId) -> Option<Product> {
        self.get(id).cloned()
    }
}

impl From<Vec<Product>> for Catalog {
    fn from(products: Vec<Product>) -> Self {
        Self::new(products)
    }
}
