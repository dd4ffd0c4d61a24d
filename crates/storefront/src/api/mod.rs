//! Catalog and order API client.
//!
//! # Architecture
//!
//! - The remote API is the source of truth for products and orders; nothing
//!   is persisted locally
//! - JSON over HTTP via `reqwest`, optional bearer token
//! - Products are cached in memory via `moka` (TTL from configuration) and
//!   invalidated when staff create or delete one; orders are never cached
//!   since staff edit them
//! - Images are uploaded as multipart forms and referenced by the returned
//!   path
//!
//! # Example
//!
//! ```rust,ignore
//! use atelier_storefront::api::CatalogClient;
//!
//! let client = CatalogClient::new(&config.api)?;
//! let product = client.get_product(&ProductId::parse("p1")?).await?;
//! ```

mod cache;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use atelier_core::progress::ProgressNotification;
use atelier_core::{Email, NewProduct, Order, OrderId, Product, ProductId};
use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogApiConfig;

use cache::{CacheKey, CacheValue};

/// Timeout applied to every API request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when talking to the catalog/order API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid endpoint: {0}")]
    Url(#[from] url::ParseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// API answered with an unexpected status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },
}

/// Body of an order progress update.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressUpdateBody<'a> {
    product_progress: &'a BTreeMap<String, u8>,
}

/// Body of a progress notification request.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotifyBody<'a> {
    order_id: &'a OrderId,
    #[serde(flatten)]
    notification: &'a ProgressNotification,
}

/// Response of the image upload endpoint.
#[derive(Deserialize)]
struct UploadResponse {
    image: String,
}

/// A file to upload to the catalog API.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the catalog/order API.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CatalogApiConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.clone(),
                token: config.token.clone(),
                cache,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send a request, mapping 404 and non-success statuses to errors.
    async fn execute(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let request = match &self.inner.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(resource.to_string()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, ApiError> {
        let body = self.execute(request, resource).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List every product in the catalog.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let url = self.endpoint("api/products")?;
        let products: Vec<Product> = self
            .fetch_json(self.inner.client.get(url), "products")
            .await?;

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get one product by id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&format!("api/products/{}", urlencoding::encode(id.as_str())))?;
        let product: Product = self
            .fetch_json(self.inner.client.get(url), &format!("product {id}"))
            .await?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Upload an image and return the stored path (e.g. `uploads/...`).
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.bytes.len()))]
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<String, ApiError> {
        let url = self.endpoint("api/upload")?;
        let mut part = reqwest::multipart::Part::bytes(upload.bytes).file_name(upload.file_name);
        if let Some(content_type) = &upload.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = reqwest::multipart::Form::new().part("image", part);

        let response: UploadResponse = self
            .fetch_json(self.inner.client.post(url).multipart(form), "upload")
            .await?;
        Ok(response.image)
    }

    /// Create a product.
    #[instrument(skip(self, product), fields(title = %product.title))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<(), ApiError> {
        let url = self.endpoint("api/products")?;
        self.execute(self.inner.client.post(url).json(product), "products")
            .await?;
        self.inner.cache.invalidate(&CacheKey::Products).await;
        Ok(())
    }

    /// Delete a product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("api/products/{}", urlencoding::encode(id.as_str())))?;
        self.execute(self.inner.client.delete(url), &format!("product {id}"))
            .await?;
        self.inner
            .cache
            .invalidate(&CacheKey::Product(id.clone()))
            .await;
        self.inner.cache.invalidate(&CacheKey::Products).await;
        Ok(())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// List all orders (staff view).
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint("api/orders")?;
        self.fetch_json(self.inner.client.get(url), "orders").await
    }

    /// List the orders placed with `email`.
    #[instrument(skip(self, email))]
    pub async fn orders_for_email(&self, email: &Email) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint(&format!(
            "api/orders/email/{}",
            urlencoding::encode(email.as_str())
        ))?;
        match self
            .fetch_json(self.inner.client.get(url), "orders for email")
            .await
        {
            Err(ApiError::NotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Get one order by id.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let url = self.endpoint(&format!("api/orders/{}", urlencoding::encode(id.as_str())))?;
        self.fetch_json(self.inner.client.get(url), &format!("order {id}"))
            .await
    }

    /// Store the full progress map of an order.
    #[instrument(skip(self, product_progress), fields(order_id = %id))]
    pub async fn update_order_progress(
        &self,
        id: &OrderId,
        product_progress: &BTreeMap<String, u8>,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("api/orders/{}", urlencoding::encode(id.as_str())))?;
        let request = self
            .inner
            .client
            .put(url)
            .json(&ProgressUpdateBody { product_progress });
        self.execute(request, &format!("order {id}")).await?;
        Ok(())
    }

    /// Ask the API to email the customer about a progress milestone.
    #[instrument(skip(self, notification), fields(order_id = %id, progress = %notification.progress))]
    pub async fn send_progress_notification(
        &self,
        id: &OrderId,
        notification: &ProgressNotification,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!(
            "api/orders/{}/notify",
            urlencoding::encode(id.as_str())
        ))?;
        let request = self.inner.client.post(url).json(&NotifyBody {
            order_id: id,
            notification,
        });
        self.execute(request, &format!("order {id}")).await?;
        Ok(())
    }
}
