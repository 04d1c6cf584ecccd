//! Configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SFS_CATALOG_URL` - Product resource URL (default: `http://127.0.0.1:8080/products.json`)
//! - `SFS_STORAGE_PATH` - JSON file backing the persistence gateway (default: `.storefront-sync.json`)
//! - `SFS_LATENCY_MS` - Simulated latency for auth calls in milliseconds; cart
//!   sync calls use half of it (default: 0)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_CATALOG_URL: &str = "http://127.0.0.1:8080/products.json";
const DEFAULT_STORAGE_PATH: &str = ".storefront-sync.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Simulated round-trip delays for calls that stand in for a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Latency {
    /// Login and registration.
    pub auth: Duration,
    /// Logout, per-user cart load and save, and catalog administration.
    pub sync: Duration,
}

impl Latency {
    /// No delay at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            auth: Duration::ZERO,
            sync: Duration::ZERO,
        }
    }

    /// Auth calls take `millis`; sync calls take half as long.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            auth: Duration::from_millis(millis),
            sync: Duration::from_millis(millis / 2),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Location of the product collection.
    pub catalog_url: Url,
    /// File backing the persistence gateway.
    pub storage_path: PathBuf,
    /// Simulated backend latency.
    pub latency: Latency,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let catalog_url = Url::parse(&env.or_default("SFS_CATALOG_URL", DEFAULT_CATALOG_URL))
            .map_err(|e| ConfigError::InvalidEnvVar("SFS_CATALOG_URL".to_string(), e.to_string()))?;
        let storage_path = PathBuf::from(env.or_default("SFS_STORAGE_PATH", DEFAULT_STORAGE_PATH));
        let latency_ms = env
            .or_default("SFS_LATENCY_MS", "0")
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar("SFS_LATENCY_MS".to_string(), e.to_string()))?;

        Ok(Self {
            catalog_url,
            storage_path,
            latency: Latency::from_millis(latency_ms),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get an optional variable; empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<SyncConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        SyncConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.catalog_url.as_str(), DEFAULT_CATALOG_URL);
        assert_eq!(config.storage_path, PathBuf::from(DEFAULT_STORAGE_PATH));
        assert_eq!(config.latency, Latency::none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("SFS_CATALOG_URL", "https://shop.test/products.json"),
            ("SFS_STORAGE_PATH", "/tmp/state.json"),
            ("SFS_LATENCY_MS", "1000"),
            ("SENTRY_DSN", ""),
        ])
        .unwrap();
        assert_eq!(config.catalog_url.host_str(), Some("shop.test"));
        assert_eq!(config.latency.auth, Duration::from_millis(1000));
        assert_eq!(config.latency.sync, Duration::from_millis(500));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("SFS_LATENCY_MS", "soon")]),
            Err(ConfigError::InvalidEnvVar(var, _)) if var == "SFS_LATENCY_MS"
        ));
        assert!(matches!(
            load(&[("SFS_CATALOG_URL", "not a url")]),
            Err(ConfigError::InvalidEnvVar(var, _)) if var == "SFS_CATALOG_URL"
        ));
    }
}
