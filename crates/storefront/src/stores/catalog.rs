//! Catalog store: the live product collection.
//!
//! The collection is replaced wholesale by [`CatalogStore::refresh`]. Overlapping
//! refreshes are not deduplicated; whichever completes last wins. Queries read
//! the current snapshot under a short read lock and never await.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument, warn};

use storefront_sync_core::{
    Catalog, CatalogLookup, Discount, NewProduct, Price, PricedProduct, Product, ProductId,
    ProductUpdate, SortOrder,
};

use crate::remote::ProductSource;

/// Errors from catalog administration.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product with the given id.
    #[error("product not found: {0}")]
    NotFound(ProductId),
}

#[derive(Debug, Default)]
struct CatalogState {
    catalog: Catalog,
    in_flight: usize,
    error: Option<String>,
    selected_category: Option<String>,
}

/// Holds the product collection and answers pricing and listing queries.
pub struct CatalogStore<S> {
    source: S,
    latency: Duration,
    state: RwLock<CatalogState>,
}

impl<S: ProductSource> CatalogStore<S> {
    /// Create an empty store fed by `source`. `latency` delays the simulated
    /// administration calls.
    #[must_use]
    pub fn new(source: S, latency: Duration) -> Self {
        Self {
            source,
            latency,
            state: RwLock::new(CatalogState::default()),
        }
    }

    /// Fetch the full collection and replace the stored one.
    ///
    /// On failure the previous collection is kept, the error flag is set and
    /// the failure is logged; nothing is returned to the caller.
    #[instrument(skip(self))]
    pub async fn refresh(&self) {
        {
            let mut state = self.write();
            state.in_flight += 1;
            state.error = None;
        }

        let result = self.source.fetch_products().await;

        let mut state = self.write();
        state.in_flight = state.in_flight.saturating_sub(1);
        match result {
            Ok(payload) => {
                info!(count = payload.products.len(), "Catalog refreshed");
                state.catalog = Catalog::new(payload.products);
            }
            Err(e) => {
                warn!(error = %e, "Catalog refresh failed; keeping previous products");
                state.error = Some(e.to_string());
            }
        }
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Append a new product with a time-derived id.
    ///
    /// # Errors
    ///
    /// Never fails today; the `Result` keeps the action signature uniform
    /// with update and delete.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn add_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        self.begin_action();
        tokio::time::sleep(self.latency).await;

        let mut state = self.write();
        state.in_flight = state.in_flight.saturating_sub(1);
        let id = next_product_id(&state.catalog);
        let product = Product::from_new(id, product);
        state.catalog.insert(product.clone());
        info!(product_id = %product.id, "Product added");
        Ok(product)
    }

    /// Merge a partial update into an existing product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has `id`.
    #[instrument(skip(self, update))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Product, CatalogError> {
        self.begin_action();
        tokio::time::sleep(self.latency).await;

        let mut state = self.write();
        state.in_flight = state.in_flight.saturating_sub(1);
        let updated = state.catalog.update(id, update).cloned();
        Self::settle(&mut state, updated.ok_or_else(|| CatalogError::NotFound(id.clone())))
    }

    /// Remove a product. Cart lines pointing at it are left dangling.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has `id`.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), CatalogError> {
        self.begin_action();
        tokio::time::sleep(self.latency).await;

        let mut state = self.write();
        state.in_flight = state.in_flight.saturating_sub(1);
        let removed = state.catalog.remove(id).map(|_| ());
        Self::settle(&mut state, removed.ok_or_else(|| CatalogError::NotFound(id.clone())))
    }

    fn begin_action(&self) {
        let mut state = self.write();
        state.in_flight += 1;
        state.error = None;
    }

    fn settle<T>(
        state: &mut CatalogState,
        result: Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        if let Err(e) = &result {
            warn!(error = %e, "Catalog action failed");
            state.error = Some(e.to_string());
        }
        result
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Copy of the current collection.
    #[must_use]
    pub fn snapshot(&self) -> Catalog {
        self.read().catalog.clone()
    }

    /// Number of products.
    #[must_use]
    pub fn total_products(&self) -> usize {
        self.read().catalog.len()
    }

    /// Products flagged active.
    #[must_use]
    pub fn active_products(&self) -> Vec<Product> {
        self.read().catalog.active()
    }

    /// Number of active products.
    #[must_use]
    pub fn active_products_count(&self) -> usize {
        self.read().catalog.products().iter().filter(|p| p.active).count()
    }

    /// Products with a non-zero discount.
    #[must_use]
    pub fn discounted_products(&self) -> Vec<Product> {
        self.read().catalog.discounted()
    }

    /// Products in the selected category, or all of them when none is selected.
    #[must_use]
    pub fn products_by_category(&self) -> Vec<Product> {
        let state = self.read();
        state.catalog.by_category(state.selected_category.as_deref())
    }

    /// Mean price, zero when empty.
    #[must_use]
    pub fn average_price(&self) -> Decimal {
        self.read().catalog.average_price()
    }

    /// Largest discount, none when empty.
    #[must_use]
    pub fn max_discount(&self) -> Discount {
        self.read().catalog.max_discount()
    }

    /// Distinct categories in first-seen order.
    #[must_use]
    pub fn available_categories(&self) -> Vec<String> {
        self.read().catalog.categories()
    }

    /// Find a product by id.
    #[must_use]
    pub fn product_by_id(&self, id: &ProductId) -> Option<Product> {
        self.read().catalog.get(id).cloned()
    }

    /// Case-insensitive name search.
    #[must_use]
    pub fn search_products(&self, query: &str) -> Vec<Product> {
        self.read().catalog.search(query)
    }

    /// Copy of the collection ordered by price.
    #[must_use]
    pub fn products_sorted_by_price(&self, order: SortOrder) -> Vec<Product> {
        self.read().catalog.sorted_by_price(order)
    }

    /// Every product with its post-discount price.
    #[must_use]
    pub fn products_with_final_price(&self) -> Vec<PricedProduct> {
        self.read().catalog.with_final_price()
    }

    /// Products priced within `min..=max`.
    #[must_use]
    pub fn filter_by_price_range(&self, min: Price, max: Price) -> Vec<Product> {
        self.read().catalog.in_price_range(min, max)
    }

    /// Select the category used by [`Self::products_by_category`].
    pub fn set_category(&self, category: Option<String>) {
        self.write().selected_category = category;
    }

    /// Currently selected category.
    #[must_use]
    pub fn selected_category(&self) -> Option<String> {
        self.read().selected_category.clone()
    }

    /// Whether a refresh or administration call is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read().in_flight > 0
    }

    /// Message from the most recent failed call, cleared when the next one starts.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: ProductSource> CatalogLookup for CatalogStore<S> {
    fn product(&self, id: &ProductId) -> Option<Product> {
        self.product_by_id(id)
    }
}

/// Time-derived id, bumped past any id already in use.
fn next_product_id(catalog: &Catalog) -> ProductId {
    let mut candidate = chrono::Utc::now().timestamp_millis();
    loop {
        let id = ProductId::new(candidate.to_string());
        if catalog.get(&id).is_none() {
            return id;
        }
        candidate += 1;
    }
}
