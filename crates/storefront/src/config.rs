//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FASTBITE_API_URL` - Base URL of the backend REST API (e.g. `https://api.fastbite.vn/api`)
//!
//! ## Optional
//! - `FASTBITE_DATA_DIR` - Directory for the local key/value store (default: `.fastbite`)
//! - `FASTBITE_CURRENCY` - Shop currency, `VND` or `USD` (default: VND)
//! - `FASTBITE_SHIPPING_FEE` - Flat delivery fee added at checkout (default: 0)
//! - `FASTBITE_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `FASTBITE_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `AI_API_KEY` - Anthropic API key; enables free-form chatbot answers
//! - `AI_MODEL` - Model ID (default: claude-sonnet-4-20250514)
//! - `AI_API_URL` - Messages endpoint (default: Anthropic public API)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate, 0.0-1.0 (default: 0.0)

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use fastbite_core::CurrencyCode;
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_AI_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_AI_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend REST API base URL (always ends with `/`)
    pub api_url: Url,
    /// Directory holding the local key/value store
    pub data_dir: PathBuf,
    /// Shop currency used for display
    pub currency: CurrencyCode,
    /// Flat delivery fee added to every order
    pub shipping_fee: Decimal,
    /// Lifetime of cached catalog responses
    pub cache_ttl: Duration,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// AI completion API configuration (chatbot pass-through)
    pub ai: Option<AiConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// AI completion API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AiConfig {
    /// API key
    pub api_key: SecretString,
    /// Model ID
    pub model: String,
    /// Messages endpoint URL
    pub api_url: String,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the AI key fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url("FASTBITE_API_URL", &get_required_env("FASTBITE_API_URL")?)?;
        let data_dir = PathBuf::from(get_env_or_default("FASTBITE_DATA_DIR", ".fastbite"));
        let currency = parse_env("FASTBITE_CURRENCY", "VND")?;
        let shipping_fee = parse_env("FASTBITE_SHIPPING_FEE", "0")?;
        let cache_ttl = Duration::from_secs(parse_env("FASTBITE_CACHE_TTL_SECS", "300")?);
        let http_timeout = Duration::from_secs(parse_env("FASTBITE_HTTP_TIMEOUT_SECS", "15")?);
        let ai = AiConfig::from_env()?;

        Ok(Self {
            api_url,
            data_dir,
            currency,
            shipping_fee,
            cache_ttl,
            http_timeout,
            ai,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Configuration with defaults for everything but the API URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not a valid URL.
    pub fn with_api_url(api_url: &str, data_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url("api_url", api_url)?,
            data_dir: data_dir.into(),
            currency: CurrencyCode::VND,
            shipping_fee: Decimal::ZERO,
            cache_ttl: Duration::from_secs(300),
            http_timeout: Duration::from_secs(15),
            ai: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        })
    }
}

impl AiConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = get_optional_env("AI_API_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&api_key, "AI_API_KEY")?;

        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            model: get_env_or_default("AI_MODEL", DEFAULT_AI_MODEL),
            api_url: get_env_or_default("AI_API_URL", DEFAULT_AI_API_URL),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a base URL, forcing a trailing slash so `Url::join` keeps the path.
fn parse_api_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme: {}", url.scheme()),
        ));
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}
