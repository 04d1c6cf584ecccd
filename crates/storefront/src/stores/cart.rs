//! Cart store: line items, totals and snapshot persistence.
//!
//! Every mutator writes the full cart to the gateway under the current
//! [`CartScope`] key before it returns. Totals are joined against the catalog
//! through the [`CatalogLookup`] capability handed in at construction.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use storefront_sync_core::{
    Cart, CartLine, CartLineDetails, CartTotals, CatalogLookup, HydrationStatus, Price, ProductId,
    UserId,
};

use crate::error::add_breadcrumb;
use crate::persistence::{CartScope, PersistenceGateway, StorageError};

#[derive(Debug, Default)]
struct CartState {
    cart: Cart,
    scope: CartScope,
    in_flight: usize,
    error: Option<String>,
    hydration: HydrationStatus,
}

/// Owns the cart and keeps its persisted snapshot current.
pub struct CartStore {
    state: RwLock<CartState>,
    gateway: Arc<dyn PersistenceGateway>,
    catalog: Arc<dyn CatalogLookup>,
    latency: Duration,
}

impl CartStore {
    /// Create an empty anonymous cart. `latency` delays the per-user bridges.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        catalog: Arc<dyn CatalogLookup>,
        latency: Duration,
    ) -> Self {
        Self {
            state: RwLock::new(CartState::default()),
            gateway,
            catalog,
            latency,
        }
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    /// Add one of `product_id`, creating the line if needed.
    pub fn add_to_cart(&self, product_id: &ProductId, product_name: &str) {
        self.mutate(|cart| cart.add(product_id, product_name));
        add_breadcrumb("cart", "Added product", Some(&[("product_id", product_id.as_str())]));
    }

    /// Take one of `product_id` away; the line goes when its count would hit zero.
    pub fn decrease_from_cart(&self, product_id: &ProductId) {
        self.mutate(|cart| cart.decrease(product_id));
    }

    /// Drop the line for `product_id` if there is one.
    pub fn remove_from_cart(&self, product_id: &ProductId) {
        if self.mutate(|cart| cart.remove(product_id)) {
            add_breadcrumb("cart", "Removed product", Some(&[("product_id", product_id.as_str())]));
        }
    }

    /// Set the count of an existing line. Zero or less removes it.
    pub fn update_quantity(&self, product_id: &ProductId, count: i64) {
        self.mutate(|cart| cart.set_quantity(product_id, count));
    }

    /// Empty the cart.
    pub fn clear_cart(&self) {
        self.mutate(Cart::clear);
    }

    /// Replace the whole cart without re-validating it.
    ///
    /// Used for hydration, so no snapshot is written.
    pub fn load_cart(&self, cart: Cart) {
        self.write().cart = cart;
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Cart) -> R) -> R {
        let mut state = self.write();
        let result = f(&mut state.cart);
        self.write_snapshot(&state.cart, &state.scope);
        result
    }

    fn write_snapshot(&self, cart: &Cart, scope: &CartScope) {
        let written = serde_json::to_string(cart)
            .map_err(StorageError::from)
            .and_then(|json| self.gateway.set(&scope.key(), &json));
        if let Err(e) = written {
            warn!(scope = %scope, error = %e, "Failed to write cart snapshot");
        }
    }

    // =========================================================================
    // Scope and hydration
    // =========================================================================

    /// Key future snapshots under `scope`. The cart contents are untouched.
    pub fn rebind(&self, scope: CartScope) {
        debug!(scope = %scope, "Cart scope rebound");
        self.write().scope = scope;
    }

    /// Scope snapshots are currently written under.
    #[must_use]
    pub fn scope(&self) -> CartScope {
        self.read().scope.clone()
    }

    /// Synchronously load the current scope's snapshot, if any.
    pub fn restore(&self) -> HydrationStatus {
        let mut state = self.write();
        let scope = state.scope.clone();
        let status = self.hydrate(&mut state, &scope);
        state.hydration = status;
        status
    }

    /// Load the snapshot saved for `user_id`, then key future snapshots
    /// under that user.
    ///
    /// Until the load lands, edits keep writing to the previous scope so the
    /// saved user cart is never overwritten before it is read. Failures are
    /// logged and reflected in [`Self::hydration_status`]; the in-memory cart
    /// is left as it was.
    #[instrument(skip(self))]
    pub async fn sync_cart_with_server(&self, user_id: &UserId) -> HydrationStatus {
        self.begin_bridge(true);
        tokio::time::sleep(self.latency).await;

        let scope = CartScope::User(user_id.clone());
        let mut state = self.write();
        let status = self.hydrate(&mut state, &scope);
        debug!(scope = %scope, "Cart scope rebound");
        state.scope = scope;
        state.in_flight = state.in_flight.saturating_sub(1);
        state.hydration = status;
        if status == HydrationStatus::Failed {
            state.error = Some(format!("could not load saved cart for user {user_id}"));
        }
        status
    }

    /// Save the current cart under `user_id`'s key.
    ///
    /// Failures are logged and recorded in [`Self::error`], never returned.
    #[instrument(skip(self))]
    pub async fn save_cart_to_server(&self, user_id: &UserId) {
        self.begin_bridge(false);
        tokio::time::sleep(self.latency).await;

        let key = CartScope::User(user_id.clone()).key();
        let json = serde_json::to_string(&self.read().cart).map_err(StorageError::from);
        let saved = json.and_then(|json| self.gateway.set(&key, &json));

        let mut state = self.write();
        state.in_flight = state.in_flight.saturating_sub(1);
        match saved {
            Ok(()) => info!(key = %key, "Cart saved"),
            Err(e) => {
                error!(key = %key, error = %e, "Failed to save cart");
                state.error = Some(e.to_string());
            }
        }
    }

    fn begin_bridge(&self, hydrating: bool) {
        let mut state = self.write();
        state.in_flight += 1;
        state.error = None;
        if hydrating {
            state.hydration = HydrationStatus::Pending;
        }
    }

    fn hydrate(&self, state: &mut CartState, scope: &CartScope) -> HydrationStatus {
        let Some(saved) = self.gateway.get(&scope.key()) else {
            debug!(scope = %scope, "No saved cart");
            return HydrationStatus::NothingSaved;
        };
        match serde_json::from_str::<Cart>(&saved) {
            Ok(cart) => {
                info!(scope = %scope, lines = cart.lines().len(), "Saved cart loaded");
                state.cart = cart;
                HydrationStatus::Loaded
            }
            Err(e) => {
                error!(scope = %scope, error = %e, "Saved cart is unreadable");
                HydrationStatus::Failed
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Copy of the cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.read().cart.clone()
    }

    /// Copy of the lines in order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.read().cart.lines().to_vec()
    }

    /// Count of `product_id`, zero when absent.
    #[must_use]
    pub fn get_product_count(&self, product_id: &ProductId) -> u32 {
        self.read().cart.count_of(product_id)
    }

    /// Sum of all line counts, dangling lines included.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.read().cart.item_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().cart.is_empty()
    }

    /// Undiscounted total.
    #[must_use]
    pub fn total_original_price(&self) -> Price {
        self.read().cart.total_original_price(self.catalog.as_ref())
    }

    /// Discounted total.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.read().cart.total_price(self.catalog.as_ref())
    }

    /// Amount saved by discounts.
    #[must_use]
    pub fn total_discount(&self) -> Price {
        self.totals().total_discount
    }

    /// All three totals from one read of the cart.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.read().cart.totals(self.catalog.as_ref())
    }

    /// Lines joined with their current catalog entry.
    #[must_use]
    pub fn cart_items_with_details(&self) -> Vec<CartLineDetails> {
        self.read().cart.with_details(self.catalog.as_ref())
    }

    /// Result of the latest hydration attempt.
    #[must_use]
    pub fn hydration_status(&self) -> HydrationStatus {
        self.read().hydration
    }

    /// Whether a per-user bridge call is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read().in_flight > 0
    }

    /// Message from the latest failed bridge call.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, CartState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CartState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use storefront_sync_core::{Catalog, Discount, Product};

    use super::*;
    use crate::persistence::{MemoryStorage, keys};

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::new(vec![Product {
            id: ProductId::new("p1"),
            name: "Lamp".to_string(),
            price: Price::new(Decimal::from(100)).unwrap(),
            discount: Discount::new(Decimal::from(10)).unwrap(),
            active: true,
            cover_image: String::new(),
            images: Vec::new(),
            category: None,
            description: None,
        }]))
    }

    fn store() -> (CartStore, Arc<MemoryStorage>) {
        let gateway = Arc::new(MemoryStorage::new());
        let store = CartStore::new(gateway.clone(), catalog(), Duration::ZERO);
        (store, gateway)
    }

    fn saved(gateway: &MemoryStorage, key: &str) -> Cart {
        serde_json::from_str(&gateway.get(key).unwrap()).unwrap()
    }

    #[test]
    fn test_add_then_decrease_empties_cart() {
        let (store, _) = store();
        let p1 = ProductId::new("p1");

        store.add_to_cart(&p1, "Lamp");
        assert_eq!(store.item_count(), 1);
        store.decrease_from_cart(&p1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_every_mutation_writes_snapshot() {
        let (store, gateway) = store();
        let p1 = ProductId::new("p1");

        store.add_to_cart(&p1, "Lamp");
        store.add_to_cart(&p1, "Lamp");
        assert_eq!(saved(&gateway, keys::ANONYMOUS_CART).count_of(&p1), 2);

        store.update_quantity(&p1, 5);
        assert_eq!(saved(&gateway, keys::ANONYMOUS_CART).count_of(&p1), 5);

        store.clear_cart();
        assert!(saved(&gateway, keys::ANONYMOUS_CART).is_empty());
    }

    #[test]
    fn test_totals_join_catalog() {
        let (store, _) = store();
        let p1 = ProductId::new("p1");
        store.add_to_cart(&p1, "Lamp");
        store.add_to_cart(&p1, "Lamp");
        store.add_to_cart(&ProductId::new("gone"), "Ghost");

        let totals = store.totals();
        assert_eq!(totals.total_original_price.amount(), Decimal::from(200));
        assert_eq!(totals.total_price.amount(), Decimal::from(180));
        assert_eq!(store.total_discount().amount(), Decimal::from(20));
        assert_eq!(store.item_count(), 3);

        let details = store.cart_items_with_details();
        assert!(details[0].product.is_some());
        assert!(details[1].product.is_none());
    }

    #[test]
    fn test_rebind_changes_snapshot_key() {
        let (store, gateway) = store();
        store.rebind(CartScope::User(UserId::new("7")));
        store.add_to_cart(&ProductId::new("p1"), "Lamp");

        assert!(gateway.get("cart_7").is_some());
        assert!(gateway.get(keys::ANONYMOUS_CART).is_none());
    }

    #[test]
    fn test_restore_reads_current_scope() {
        let (store, gateway) = store();
        assert_eq!(store.restore(), HydrationStatus::NothingSaved);

        gateway
            .set(
                keys::ANONYMOUS_CART,
                r#"{"items":[{"productId":"p1","productName":"Lamp","count":3}]}"#,
            )
            .unwrap();
        assert_eq!(store.restore(), HydrationStatus::Loaded);
        assert_eq!(store.get_product_count(&ProductId::new("p1")), 3);
    }

    #[test]
    fn test_load_cart_writes_no_snapshot() {
        let (store, gateway) = store();
        let saved: Cart =
            serde_json::from_str(r#"{"items":[{"productId":"p1","productName":"Lamp","count":2}]}"#)
                .unwrap();

        store.load_cart(saved.clone());
        assert_eq!(store.cart(), saved);
        assert!(gateway.get(keys::ANONYMOUS_CART).is_none());
    }

    #[tokio::test]
    async fn test_sync_distinguishes_missing_from_corrupt() {
        let (store, gateway) = store();
        let user = UserId::new("1");
        store.add_to_cart(&ProductId::new("p1"), "Lamp");

        assert_eq!(store.sync_cart_with_server(&user).await, HydrationStatus::NothingSaved);
        assert_eq!(store.item_count(), 1);
        assert!(store.error().is_none());

        gateway.set("cart_1", "{not json").unwrap();
        assert_eq!(store.sync_cart_with_server(&user).await, HydrationStatus::Failed);
        assert_eq!(store.hydration_status(), HydrationStatus::Failed);
        assert_eq!(store.item_count(), 1);
        assert!(store.error().is_some());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_save_then_sync_round_trips_order() {
        let (store, _) = store();
        let user = UserId::new("1");
        store.add_to_cart(&ProductId::new("b"), "B");
        store.add_to_cart(&ProductId::new("a"), "A");
        let before = store.lines();

        store.save_cart_to_server(&user).await;
        store.clear_cart();
        assert_eq!(store.sync_cart_with_server(&user).await, HydrationStatus::Loaded);
        assert_eq!(store.lines(), before);
    }

    #[tokio::test]
    async fn test_sync_binds_user_scope_after_loading() {
        let (store, gateway) = store();
        let user = UserId::new("3");
        gateway
            .set("cart_3", r#"{"items":[{"productId":"p1","productName":"Lamp","count":2}]}"#)
            .unwrap();

        assert_eq!(store.scope(), CartScope::Anonymous);
        assert_eq!(store.sync_cart_with_server(&user).await, HydrationStatus::Loaded);
        assert_eq!(store.scope(), CartScope::User(user));

        store.add_to_cart(&ProductId::new("p1"), "Lamp");
        assert_eq!(saved(&gateway, "cart_3").count_of(&ProductId::new("p1")), 3);
    }

    #[tokio::test]
    async fn test_edit_during_sync_keeps_saved_user_cart() {
        let gateway = Arc::new(MemoryStorage::new());
        let store = CartStore::new(gateway.clone(), catalog(), Duration::from_millis(100));
        let user = UserId::new("9");
        let p1 = ProductId::new("p1");
        let p2 = ProductId::new("p2");
        gateway
            .set("cart_9", r#"{"items":[{"productId":"p1","productName":"Lamp","count":4}]}"#)
            .unwrap();

        let (status, ()) = tokio::join!(store.sync_cart_with_server(&user), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            store.add_to_cart(&p2, "Stool");
        });

        assert_eq!(status, HydrationStatus::Loaded);
        assert_eq!(store.get_product_count(&p1), 4);
        assert_eq!(saved(&gateway, "cart_9").count_of(&p1), 4);
        assert_eq!(saved(&gateway, "cart_9").count_of(&p2), 0);
        assert_eq!(saved(&gateway, keys::ANONYMOUS_CART).count_of(&p2), 1);
    }
}
