//! Local inspection of JWT access tokens.
//!
//! The payload is decoded without verifying the signature; the backend is
//! the only party that trusts the token. Decoding here just lets us avoid
//! sending a request we already know will be rejected.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;

/// Refresh once the token has less than this left.
pub const REFRESH_THRESHOLD: Duration = Duration::minutes(15);

/// Claims we read from the payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    #[serde(default, alias = "userId", alias = "sub")]
    pub id: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Claims {
    /// Expiry as a timestamp; `None` if `exp` is out of range.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Decode the payload segment of a JWT.
///
/// Returns `None` if the token does not have three segments or the payload
/// is not base64url-encoded JSON with an `exp` claim.
#[must_use]
pub fn decode_claims(token: &str) -> Option<Claims> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Freshness of a stored token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// More than [`REFRESH_THRESHOLD`] left.
    Valid,
    /// Still accepted, but close to expiry.
    NeedsRefresh,
    /// `exp` is in the past.
    Expired,
    /// Not a JWT we can read.
    Malformed,
}

impl TokenStatus {
    /// Classify `token` relative to `now`.
    #[must_use]
    pub fn of(token: &str, now: DateTime<Utc>) -> Self {
        let Some(expires_at) = decode_claims(token).and_then(|c| c.expires_at()) else {
            return Self::Malformed;
        };

        if expires_at <= now {
            Self::Expired
        } else if expires_at - now < REFRESH_THRESHOLD {
            Self::NeedsRefresh
        } else {
            Self::Valid
        }
    }

    /// Whether the token can still be sent.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        matches!(self, Self::Valid | Self::NeedsRefresh)
    }
}

/// Build an unsigned token with the given claims, for tests.
#[cfg(test)]
pub(crate) fn test_token(exp: DateTime<Utc>, user_id: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({"id": user_id, "exp": exp.timestamp(), "role": "customer"}).to_string(),
    );
    format!("{header}.{payload}.signature")
}
