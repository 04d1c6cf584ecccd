//! Integration tests for storefront-sync.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-sync-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_lifecycle` - login, register, logout and restart against one gateway
//! - `catalog_refresh` - HTTP catalog fetches and cart repricing
//! - `file_storage` - state surviving process restarts on disk
//!
//! Each test gets its own mock product server and its own storage, so tests
//! run in parallel without sharing state.

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storefront_sync::Storefront;
use storefront_sync::config::Latency;
use storefront_sync::persistence::{MemoryStorage, PersistenceGateway, StorageError};
use storefront_sync::remote::HttpProductSource;

/// Path the mock server serves the catalog on.
pub const PRODUCTS_PATH: &str = "/products.json";

/// Memory gateway whose writes can be made to fail by key prefix.
#[derive(Debug, Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    failing_prefix: RwLock<Option<String>>,
}

impl FlakyStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every write or delete to a key starting with `prefix`.
    pub fn fail_writes_to(&self, prefix: &str) {
        *self
            .failing_prefix
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(prefix.to_string());
    }

    /// Accept all writes again.
    pub fn heal(&self) {
        *self
            .failing_prefix
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn check(&self, key: &str) -> Result<(), StorageError> {
        let prefix = self
            .failing_prefix
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match prefix.as_deref() {
            Some(prefix) if key.starts_with(prefix) => Err(StorageError::Unavailable(format!(
                "writes to {key} are disabled"
            ))),
            _ => Ok(()),
        }
    }
}

impl PersistenceGateway for FlakyStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check(key)?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check(key)?;
        self.inner.remove(key)
    }
}

/// A mock product server plus an app wired to it.
pub struct TestContext {
    pub server: MockServer,
    pub gateway: Arc<FlakyStorage>,
    pub app: Storefront,
}

impl TestContext {
    /// Start a mock server and build an app over fresh in-memory storage.
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let gateway = Arc::new(FlakyStorage::new());
        let app = build_app(&server, gateway.clone());
        Self {
            server,
            gateway,
            app,
        }
    }

    /// Build a second app over the same storage and server, as a restarted process would.
    #[must_use]
    pub fn restart(&self) -> Storefront {
        build_app(&self.server, self.gateway.clone())
    }

    /// Serve `products` from every catalog fetch.
    pub async fn serve_products(&self, products: Value) {
        Mock::given(method("GET"))
            .and(path(PRODUCTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "products": products })))
            .mount(&self.server)
            .await;
    }

    /// Serve `products` for the next `times` fetches only.
    pub async fn serve_products_times(&self, products: Value, times: u64) {
        Mock::given(method("GET"))
            .and(path(PRODUCTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "products": products })))
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    /// Answer catalog fetches with `status`.
    pub async fn fail_products(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(PRODUCTS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}

/// URL of the catalog resource on `server`.
///
/// # Panics
///
/// Panics if the mock server URI is not a valid URL.
#[must_use]
pub fn products_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}{PRODUCTS_PATH}", server.uri())).expect("mock server URL")
}

fn build_app(server: &MockServer, gateway: Arc<FlakyStorage>) -> Storefront {
    Storefront::new(
        HttpProductSource::new(products_url(server)),
        gateway,
        Latency::none(),
    )
}

/// Two products: `1` at 100 with 10% off, `2` at 50 with no discount.
#[must_use]
pub fn sample_products() -> Value {
    json!([
        {
            "id": 1,
            "name": "Desk Lamp",
            "price": 100,
            "discount": 10,
            "active": true,
            "coverImage": "/img/lamp.jpg",
            "images": [],
            "category": "lighting"
        },
        {
            "id": "2",
            "name": "Stool",
            "price": 50,
            "discount": 0,
            "active": false,
            "images": [],
            "category": "seating"
        }
    ])
}
