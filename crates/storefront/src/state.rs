//! Application root wiring the stores together.

use std::sync::Arc;

use tracing::info;

use storefront_sync_core::{CatalogLookup, HydrationStatus};

use crate::config::{Latency, SyncConfig};
use crate::persistence::{FileStorage, PersistenceGateway, StorageError};
use crate::remote::{HttpProductSource, ProductSource};
use crate::stores::{CartStore, CatalogStore, IdentityStore};

/// Application state shared by every caller.
///
/// Cheaply cloneable via `Arc`. The stores live exactly as long as the last
/// clone.
pub struct Storefront<S = HttpProductSource> {
    inner: Arc<StorefrontInner<S>>,
}

struct StorefrontInner<S> {
    catalog: Arc<CatalogStore<S>>,
    cart: Arc<CartStore>,
    identity: IdentityStore,
    gateway: Arc<dyn PersistenceGateway>,
}

impl<S> Clone for Storefront<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ProductSource + 'static> Storefront<S> {
    /// Build the three stores over one gateway.
    ///
    /// # Arguments
    ///
    /// * `source` - Where the catalog is fetched from
    /// * `gateway` - Key-value storage shared by cart and identity
    /// * `latency` - Simulated backend delays
    #[must_use]
    pub fn new(source: S, gateway: Arc<dyn PersistenceGateway>, latency: Latency) -> Self {
        let catalog = Arc::new(CatalogStore::new(source, latency.sync));
        let lookup: Arc<dyn CatalogLookup> = catalog.clone();
        let cart = Arc::new(CartStore::new(gateway.clone(), lookup, latency.sync));
        let identity = IdentityStore::new(cart.clone(), gateway.clone(), latency);

        Self {
            inner: Arc::new(StorefrontInner {
                catalog,
                cart,
                identity,
                gateway,
            }),
        }
    }

    /// Restore whatever the previous run left behind.
    ///
    /// With a persisted session the user's cart is hydrated and awaited;
    /// otherwise the anonymous cart snapshot is loaded.
    pub async fn bootstrap(&self) -> HydrationStatus {
        let status = match self.identity().check_auth() {
            Some(handle) => handle.wait().await,
            None => self.cart().restore(),
        };
        info!(scope = %self.cart().scope(), hydration = ?status, "Storefront bootstrapped");
        status
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogStore<S> {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn identity(&self) -> &IdentityStore {
        &self.inner.identity
    }

    /// The storage every snapshot and session key goes through.
    #[must_use]
    pub fn gateway(&self) -> &dyn PersistenceGateway {
        self.inner.gateway.as_ref()
    }
}

impl Storefront<HttpProductSource> {
    /// Build from configuration: HTTP catalog and file-backed storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage file exists but cannot be read.
    pub fn from_config(config: &SyncConfig) -> Result<Self, StorageError> {
        let gateway = Arc::new(FileStorage::open(&config.storage_path)?);
        let source = HttpProductSource::new(config.catalog_url.clone());
        Ok(Self::new(source, gateway, config.latency))
    }
}
