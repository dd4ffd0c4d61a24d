//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use atelier_core::image::resolve_image_url;

use crate::api::{ApiError, CatalogClient};
use crate::carts::CartStore;
use crate::config::StorefrontConfig;
use crate::middleware::session::SESSION_EXPIRY_SECONDS;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Carts are keyed by the cart id held in each
/// browser session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogClient,
    carts: CartStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the API HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let catalog = CatalogClient::new(&config.api)?;
        let carts = CartStore::new(Duration::from_secs(SESSION_EXPIRY_SECONDS.unsigned_abs()));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                carts,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog/order API client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn carts(&self) -> &CartStore {
        &self.inner.carts
    }

    /// Resolve a stored image path against the API's upload host.
    #[must_use]
    pub fn image_url(&self, path: Option<&str>) -> String {
        resolve_image_url(path, self.inner.config.api.origin())
    }
}
