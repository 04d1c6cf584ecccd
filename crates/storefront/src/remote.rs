//! Remote product source.
//!
//! The catalog is fetched in one request from a single static resource
//! shaped as `{"products": [...]}`. Any non-success status, transport failure
//! or undecodable body is a [`FetchError`]; there are no retries.

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, instrument};
use url::Url;

use storefront_sync_core::Product;

/// Errors that can occur while fetching the product collection.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Leading excerpt of the response body.
        body: String,
    },

    /// The body was not a valid product payload.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Body of the product resource.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductsPayload {
    pub products: Vec<Product>,
}

/// One-shot asynchronous fetch of the full product collection.
pub trait ProductSource: Send + Sync {
    /// Fetch every product.
    fn fetch_products(&self) -> impl Future<Output = Result<ProductsPayload, FetchError>> + Send;
}

/// Maximum number of body characters kept in errors and logs.
const BODY_EXCERPT_CHARS: usize = 200;

/// [`ProductSource`] that GETs a JSON document over HTTP.
#[derive(Debug, Clone)]
pub struct HttpProductSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpProductSource {
    /// Create a source for `url`.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    /// The resource being fetched.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

impl ProductSource for HttpProductSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_products(&self) -> Result<ProductsPayload, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            let body: String = response_text.chars().take(BODY_EXCERPT_CHARS).collect();
            error!(status = %status, body = %body, "Product source returned non-success status");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ProductsPayload = serde_json::from_str(&response_text).map_err(|e| {
            error!(
                error = %e,
                body = %response_text.chars().take(BODY_EXCERPT_CHARS).collect::<String>(),
                "Failed to parse product payload"
            );
            FetchError::Parse(e)
        })?;

        debug!(count = payload.products.len(), "Fetched products");
        Ok(payload)
    }
}
