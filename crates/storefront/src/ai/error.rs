//! Error types for the AI completion client.

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when calling the AI completion API.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an error body.
    #[error("API error ({error_type}): {message}")]
    Api { error_type: String, message: String },

    /// Rate limited by the provider.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// API key rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse the response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The response carried no text.
    #[error("empty completion")]
    Empty,

    /// The API key cannot be sent as a header.
    #[error("invalid API key header")]
    InvalidKey,
}

/// Error body returned by the provider.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}
