//! REST client for the FastBite backend.
//!
//! # Architecture
//!
//! - One [`ApiClient`] per process, cheaply cloneable (`Arc` inside)
//! - The backend is the source of truth - no local sync beyond the cart mirror
//! - Catalog reads (products, categories, banners) are cached via `moka`
//! - Every response uses the envelope `{"success", "data", "message", "pagination"}`
//! - Authenticated calls carry `Authorization: Bearer <jwt>`
//!
//! Resource methods live in one file per resource (`products.rs`,
//! `orders.rs`, ...) as additional `impl ApiClient` blocks.
//!
//! # Example
//!
//! ```rust,ignore
//! use fastbite_storefront::api::{ApiClient, ProductQuery};
//!
//! let client = ApiClient::new(&config)?;
//! let page = client.get_products(&ProductQuery::default()).await?;
//! let product = client.get_product(&page.items[0].id).await?;
//! ```

mod auth;
mod banners;
mod cache;
mod cart;
mod categories;
mod orders;
mod payments;
mod products;
mod promotions;
mod recommendations;
mod reviews;

pub use auth::{AuthResponse, RegisterRequest};
pub use orders::{CreateOrderItem, CreateOrderRequest};
pub use payments::{PaymentRedirect, PaymentStatusResponse};
pub use products::{ProductQuery, ProductSort};
pub use promotions::AppliedCoupon;
pub use recommendations::{BehaviorAction, BehaviorEvent};

use std::sync::Arc;

use fastbite_core::Pagination;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::config::StorefrontConfig;

use cache::CacheValue;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request path could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// 401 or 403: token missing, expired, or rejected.
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response, or `success: false`.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Envelope had no `data` where data was required.
    #[error("Missing data in response: {0}")]
    MissingData(String),
}

impl ApiError {
    /// Whether the request never got an answer from the backend.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// Whether the backend rejected the credentials.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Message the backend attached to the failure, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message, .. } | Self::Api { message, .. } => Some(message),
            Self::NotFound(message) => Some(message),
            _ => None,
        }
    }
}

/// Response envelope used by every endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Error body shape (`message` or `error`).
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the backend REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
    cache: moka::future::Cache<String, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let cache = moka::future::Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("fastbite-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                token: RwLock::new(None),
                cache,
            }),
        })
    }

    /// Base URL all paths are joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Set or clear the bearer token sent with every request.
    pub async fn set_token(&self, token: Option<SecretString>) {
        *self.inner.token.write().await = token;
    }

    /// Whether a bearer token is currently attached.
    pub async fn has_token(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    /// Drop every cached catalog response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }

    /// Build a request for `path` relative to the base URL.
    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        let mut builder = self.inner.client.request(method, url);
        if let Some(token) = self.inner.token.read().await.as_ref() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        Ok(builder)
    }

    /// Send a request and decode the envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_from_status(status, &body));
        }

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(e) => e,
            Err(e) => {
                warn!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse backend response"
                );
                return Err(ApiError::Parse(e));
            }
        };

        if envelope.success == Some(false) {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "request failed".to_string()),
            });
        }

        Ok(envelope)
    }

    /// Send a request and return the envelope's `data`.
    async fn execute_data<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> Result<T, ApiError> {
        self.execute::<T>(builder)
            .await?
            .data
            .ok_or_else(|| ApiError::MissingData(what.to_string()))
    }

    /// Send a request where only success matters.
    async fn execute_unit(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.execute::<serde_json::Value>(builder).await?;
        Ok(())
    }

    async fn cached(&self, key: &str) -> Option<CacheValue> {
        let hit = self.inner.cache.get(key).await;
        if hit.is_some() {
            debug!(key, "Cache hit");
        }
        hit
    }

    async fn store(&self, key: String, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }
}

/// Client pointed at a mock server, for endpoint tests.
#[cfg(test)]
pub(crate) fn test_client(server: &httpmock::MockServer) -> ApiClient {
    let config = StorefrontConfig::with_api_url(&server.base_url(), std::env::temp_dir())
        .unwrap_or_else(|e| panic!("test config: {e}"));
    ApiClient::new(&config).unwrap_or_else(|e| panic!("test client: {e}"))
}

/// Map a non-success status and body to an [`ApiError`].
fn error_from_status(status: StatusCode, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.error)
        .unwrap_or_else(|| body.chars().take(200).collect());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        _ => {
            warn!(status = %status, message = %message, "Backend returned non-success status");
            ApiError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_status_unauthorized() {
        let err = error_from_status(StatusCode::FORBIDDEN, r#"{"message":"Token expired"}"#);
        assert!(err.is_auth());
        assert_eq!(err.server_message(), Some("Token expired"));
    }

    #[test]
    fn test_error_from_status_not_found_uses_error_field() {
        let err = error_from_status(StatusCode::NOT_FOUND, r#"{"error":"Product not found"}"#);
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Product not found"));
    }

    #[test]
    fn test_error_from_status_plain_body() {
        let err = error_from_status(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "API error (502): upstream down");
        assert!(!err.is_network());
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: Envelope<Vec<u32>> =
            serde_json::from_str(r#"{"success":true,"message":"ok"}"#).unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.message.as_deref(), Some("ok"));
    }

    #[test]
    fn test_api_client_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync>() {}
        assert_traits::<ApiClient>();
    }
}
