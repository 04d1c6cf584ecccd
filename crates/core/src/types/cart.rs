//! Shopping cart lines and totals.
//!
//! A [`Cart`] is an ordered list of [`CartLine`]s with at most one line per
//! product and a strictly positive count on every line. The mutation methods
//! here are the only way the invariant is maintained; a cart decoded from a
//! snapshot is trusted as-is.

use serde::{Deserialize, Serialize};

use super::catalog::CatalogLookup;
use super::id::ProductId;
use super::price::Price;
use super::product::Product;

/// One product/quantity pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Soft reference into the catalog; may dangle.
    pub product_id: ProductId,
    /// Name captured when the line was first added.
    pub product_name: String,
    pub count: u32,
}

/// A cart line joined with its current catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineDetails {
    #[serde(flatten)]
    pub line: CartLine,
    pub product: Option<Product>,
}

/// Catalog-joined cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub total_original_price: Price,
    pub total_price: Price,
    pub total_discount: Price,
}

/// An ordered sequence of cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    items: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line counts.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.count)).sum()
    }

    /// Count for `product_id`, or 0 when there is no such line.
    #[must_use]
    pub fn count_of(&self, product_id: &ProductId) -> u32 {
        self.line(product_id).map_or(0, |line| line.count)
    }

    /// Add one unit: increments an existing line or appends a new one.
    pub fn add(&mut self, product_id: &ProductId, product_name: &str) {
        if let Some(line) = self.line_mut(product_id) {
            line.count = line.count.saturating_add(1);
        } else {
            self.items.push(CartLine {
                product_id: product_id.clone(),
                product_name: product_name.to_owned(),
                count: 1,
            });
        }
    }

    /// Remove one unit, deleting the line instead of leaving it at zero.
    ///
    /// Returns `false` if there was no such line.
    pub fn decrease(&mut self, product_id: &ProductId) -> bool {
        match self.line_mut(product_id) {
            Some(line) if line.count > 1 => {
                line.count -= 1;
                true
            }
            Some(_) => self.remove(product_id),
            None => false,
        }
    }

    /// Delete the line for `product_id`. Returns `false` if it was absent.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| &line.product_id != product_id);
        self.items.len() != before
    }

    /// Set the count of an existing line. A count of zero or less removes
    /// the line. Absent lines are left alone.
    ///
    /// Returns `false` if there was no such line.
    pub fn set_quantity(&mut self, product_id: &ProductId, count: i64) -> bool {
        if count <= 0 {
            return self.remove(product_id);
        }
        match self.line_mut(product_id) {
            Some(line) => {
                line.count = u32::try_from(count).unwrap_or(u32::MAX);
                true
            }
            None => false,
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Σ `price × count` over lines whose product is in the catalog.
    #[must_use]
    pub fn total_original_price(&self, catalog: &dyn CatalogLookup) -> Price {
        self.joined_sum(catalog, |product| product.price)
    }

    /// Σ `final_price × count` over lines whose product is in the catalog.
    #[must_use]
    pub fn total_price(&self, catalog: &dyn CatalogLookup) -> Price {
        self.joined_sum(catalog, Product::final_price)
    }

    /// All three totals from a single pass over the catalog.
    #[must_use]
    pub fn totals(&self, catalog: &dyn CatalogLookup) -> CartTotals {
        let (original, discounted) = self
            .items
            .iter()
            .filter_map(|line| catalog.product(&line.product_id).map(|p| (p, line.count)))
            .fold((Price::ZERO, Price::ZERO), |(original, discounted), (product, count)| {
                (
                    original + product.price * count,
                    discounted + product.final_price() * count,
                )
            });
        CartTotals {
            total_original_price: original,
            total_price: discounted,
            total_discount: original - discounted,
        }
    }

    /// Lines paired with their catalog product, if it still exists.
    #[must_use]
    pub fn with_details(&self, catalog: &dyn CatalogLookup) -> Vec<CartLineDetails> {
        self.items
            .iter()
            .map(|line| CartLineDetails {
                line: line.clone(),
                product: catalog.product(&line.product_id),
            })
            .collect()
    }

    fn joined_sum(&self, catalog: &dyn CatalogLookup, unit: impl Fn(&Product) -> Price) -> Price {
        self.items
            .iter()
            .filter_map(|line| catalog.product(&line.product_id).map(|p| unit(&p) * line.count))
            .sum()
    }

    fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.items.iter().find(|line| &line.product_id == product_id)
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLine> {
        self.items.iter_mut().find(|line| &line.product_id == product_id)
    }
}

impl From<Vec<CartLine>> for Cart {
    fn from(items: Vec<CartLine>) -> Self {
        Self { items }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::catalog::Catalog;
    use crate::types::price::Discount;

    fn pid(id: &str) -> ProductId {
        ProductId::new(id)
    }

    fn catalog() -> Catalog {
        let product = |id: &str, price: i64, discount: i64| Product {
            id: pid(id),
            name: format!("Product {id}"),
            price: Price::new(Decimal::from(price)).unwrap(),
            discount: Discount::new(Decimal::from(discount)).unwrap(),
            active: true,
            cover_image: String::new(),
            images: Vec::new(),
            category: None,
            description: None,
        };
        Catalog::new(vec![product("p1", 100, 10), product("p2", 15, 0)])
    }

    fn amount(price: Price) -> Decimal {
        price.amount()
    }

    #[test]
    fn test_add_same_product_increments() {
        let mut cart = Cart::new();
        for _ in 0..5 {
            cart.add(&pid("p1"), "Widget");
        }
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.count_of(&pid("p1")), 5);
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_add_keeps_first_name_snapshot() {
        let mut cart = Cart::new();
        cart.add(&pid("p1"), "Widget");
        cart.add(&pid("p1"), "Renamed Widget");
        assert_eq!(cart.lines()[0].product_name, "Widget");
    }

    #[test]
    fn test_decrease_to_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add(&pid("p1"), "Widget");
        cart.add(&pid("p1"), "Widget");
        assert!(cart.decrease(&pid("p1")));
        assert_eq!(cart.count_of(&pid("p1")), 1);
        assert!(cart.decrease(&pid("p1")));
        assert!(cart.is_empty());
        assert!(!cart.decrease(&pid("p1")));
    }

    #[test]
    fn test_set_quantity_non_positive_matches_remove() {
        let mut by_update = Cart::new();
        by_update.add(&pid("p1"), "Widget");
        by_update.add(&pid("p2"), "Gadget");
        let mut by_remove = by_update.clone();

        for n in [0, -1, -100] {
            let mut cart = by_update.clone();
            cart.set_quantity(&pid("p1"), n);
            by_remove.remove(&pid("p1"));
            assert_eq!(cart, by_remove);
        }
        by_update.set_quantity(&pid("p2"), 7);
        assert_eq!(by_update.count_of(&pid("p2")), 7);
    }

    #[test]
    fn test_set_quantity_on_absent_line_is_noop() {
        let mut cart = Cart::new();
        assert!(!cart.set_quantity(&pid("p1"), 3));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals_join_against_catalog() {
        let mut cart = Cart::new();
        cart.add(&pid("p1"), "Widget");
        cart.add(&pid("p1"), "Widget");
        let catalog = catalog();

        assert_eq!(amount(cart.total_original_price(&catalog)), Decimal::from(200));
        assert_eq!(amount(cart.total_price(&catalog)), Decimal::from(180));
        let totals = cart.totals(&catalog);
        assert_eq!(amount(totals.total_discount), Decimal::from(20));
        assert_eq!(totals.total_price, cart.total_price(&catalog));
    }

    #[test]
    fn test_dangling_line_contributes_nothing() {
        let mut cart = Cart::new();
        cart.add(&pid("pX"), "Ghost");
        cart.add(&pid("p2"), "Gadget");
        let catalog = catalog();

        assert_eq!(cart.item_count(), 2);
        assert_eq!(amount(cart.total_price(&catalog)), Decimal::from(15));
        let details = cart.with_details(&catalog);
        assert!(details[0].product.is_none());
        assert!(details[1].product.is_some());
    }

    #[test]
    fn test_snapshot_format_and_order() {
        let mut cart = Cart::new();
        cart.add(&pid("b"), "Second");
        cart.add(&pid("a"), "First");
        cart.add(&pid("b"), "Second");

        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"items": [
                {"productId": "b", "productName": "Second", "count": 2},
                {"productId": "a", "productName": "First", "count": 1}
            ]})
        );
        let reloaded: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(reloaded, cart);
    }
}
