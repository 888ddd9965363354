//! Admin REST client for the FastBite backend.
//!
//! Same envelope and status conventions as the storefront client, but every
//! request is authenticated with the admin token, nothing is cached (admins
//! need fresh data after each write), and create/update calls for products
//! and banners are sent as `multipart/form-data` with the image as a file
//! part.
//!
//! Resource methods live in one file per resource as additional
//! `impl AdminClient` blocks.

mod banners;
mod coupons;
mod orders;
mod products;

pub use orders::OrderFilter;

use std::sync::Arc;

use fastbite_core::{Page, Pagination};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::config::AdminConfig;
use crate::forms::Upload;

/// Errors that can occur when calling the admin API.
#[derive(Debug, Error)]
pub enum AdminApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// 401 or 403: the admin token is missing, expired, or not an admin.
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Missing data in response: {0}")]
    MissingData(String),
}

impl AdminApiError {
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Whether the failure is on the server or the network rather than in
    /// the request.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) | Self::MissingData(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Url(_) | Self::Unauthorized { .. } | Self::NotFound(_) | Self::RateLimited(_) => {
                false
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default = "Option::default")]
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Admin API client.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: SecretString,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl AdminClient {
    /// Create a new admin client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AdminConfig) -> Result<Self, AdminApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fastbite-admin/", env!("CARGO_PKG_VERSION")))
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client,
                base_url: config.api_url.clone(),
                token: config.token.clone(),
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, AdminApiError> {
        let url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        Ok(self
            .inner
            .client
            .request(method, url)
            .bearer_auth(self.inner.token.expose_secret()))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Envelope<T>, AdminApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(AdminApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(error_from_status(status, &body));
        }

        // DELETE endpoints may answer 204 with no body.
        if body.trim().is_empty() {
            return Ok(Envelope {
                success: Some(true),
                data: None,
                message: None,
                pagination: None,
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            warn!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse admin response"
            );
            AdminApiError::Parse(e)
        })?;

        if envelope.success == Some(false) {
            return Err(AdminApiError::Api {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "request failed".to_string()),
            });
        }

        Ok(envelope)
    }

    async fn execute_data<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> Result<T, AdminApiError> {
        self.execute::<T>(builder)
            .await?
            .data
            .ok_or_else(|| AdminApiError::MissingData(what.to_string()))
    }

    async fn execute_page<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Page<T>, AdminApiError> {
        let envelope = self.execute::<Vec<T>>(builder).await?;
        let items = envelope.data.unwrap_or_default();
        Ok(match envelope.pagination {
            Some(pagination) => Page { items, pagination },
            None => Page::single(items),
        })
    }

    async fn execute_unit(&self, builder: RequestBuilder) -> Result<(), AdminApiError> {
        self.execute::<serde_json::Value>(builder).await?;
        Ok(())
    }
}

/// Build a multipart form from text fields and an optional image part.
fn multipart_form(
    fields: Vec<(&'static str, String)>,
    image: Option<&Upload>,
) -> Result<Form, AdminApiError> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name, value);
    }
    if let Some(upload) = image {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(upload.content_type)?;
        form = form.part("image", part);
    }
    Ok(form)
}

#[cfg(test)]
pub(crate) fn test_client(server: &httpmock::MockServer) -> AdminClient {
    let config = AdminConfig::new(&server.base_url(), "admin-test-token")
        .unwrap_or_else(|e| panic!("test config: {e}"));
    AdminClient::new(&config).unwrap_or_else(|e| panic!("test client: {e}"))
}

fn error_from_status(status: StatusCode, body: &str) -> AdminApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.error)
        .unwrap_or_else(|| body.chars().take(200).collect());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AdminApiError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        StatusCode::NOT_FOUND => AdminApiError::NotFound(message),
        _ => {
            warn!(status = %status, message = %message, "Admin API returned non-success status");
            AdminApiError::Api {
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
    fn test_error_from_status() {
        assert!(error_from_status(StatusCode::FORBIDDEN, r#"{"message":"Admin only"}"#).is_auth());

        match error_from_status(StatusCode::BAD_REQUEST, r#"{"error":"Tên sản phẩm đã tồn tại"}"#) {
            AdminApiError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Tên sản phẩm đã tồn tại");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_server_side_classification() {
        let err = AdminApiError::Api {
            status: 503,
            message: String::new(),
        };
        assert!(err.is_server_side());
        assert!(!AdminApiError::NotFound("x".into()).is_server_side());
    }
}
