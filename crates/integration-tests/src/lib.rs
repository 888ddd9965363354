//! Integration tests for FastBite.
//!
//! The tests in `tests/` drive the storefront and admin libraries end to end
//! against an [`httpmock`] backend. Storefront sessions use real file storage
//! in a temporary directory, so a test can reopen the store and observe
//! exactly what a restarted client would see.
//!
//! # Helpers
//!
//! - [`open_storefront`] - storefront over file storage in a temp dir
//! - [`reopen_storefront`] - a second client over the same directory
//! - [`open_admin`] - admin client with a fixed token
//! - [`jwt`] - unsigned JWT carrying `id` and `exp` claims
//! - [`envelope`] / [`paged`] - backend response envelopes

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use fastbite_admin::Admin;
use fastbite_admin::config::AdminConfig;
use fastbite_storefront::Storefront;
use fastbite_storefront::config::StorefrontConfig;
use httpmock::MockServer;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Token used by every admin client built here.
pub const ADMIN_TOKEN: &str = "admin-test-token";

/// A storefront plus the directory backing its store.
///
/// Keep the `TempDir` alive for as long as the storefront is used.
pub struct StorefrontFixture {
    pub storefront: Storefront,
    pub dir: TempDir,
}

/// Open a storefront against `server` with a fresh data directory.
///
/// # Panics
///
/// Panics if the temp dir or the storefront cannot be created.
#[must_use]
pub fn open_storefront(server: &MockServer) -> StorefrontFixture {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("temp dir: {e}"));
    let storefront = reopen_storefront(server, dir.path());
    StorefrontFixture { storefront, dir }
}

/// Open another storefront over an existing data directory.
///
/// # Panics
///
/// Panics if the storefront cannot be created.
#[must_use]
pub fn reopen_storefront(server: &MockServer, data_dir: &Path) -> Storefront {
    let config = StorefrontConfig::with_api_url(&server.base_url(), data_dir)
        .unwrap_or_else(|e| panic!("storefront config: {e}"));
    Storefront::open(config).unwrap_or_else(|e| panic!("storefront: {e}"))
}

/// Admin client against `server`, authenticated with [`ADMIN_TOKEN`].
///
/// # Panics
///
/// Panics if the client cannot be created.
#[must_use]
pub fn open_admin(server: &MockServer, page_size: u32) -> Admin {
    let mut config = AdminConfig::new(&server.base_url(), ADMIN_TOKEN)
        .unwrap_or_else(|e| panic!("admin config: {e}"));
    config.page_size = page_size;
    Admin::new(config).unwrap_or_else(|e| panic!("admin: {e}"))
}

/// An unsigned JWT for `user_id` expiring at `exp`.
#[must_use]
pub fn jwt(user_id: &str, exp: DateTime<Utc>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD
        .encode(json!({"id": user_id, "exp": exp.timestamp(), "role": "customer"}).to_string());
    format!("{header}.{payload}.signature")
}

/// `{"success": true, "data": ...}`
#[must_use]
pub fn envelope(data: Value) -> Value {
    json!({"success": true, "data": data})
}

/// A paginated list envelope.
#[must_use]
pub fn paged(data: Value, page: u32, limit: u32, total: u64) -> Value {
    let total_pages = total.div_ceil(u64::from(limit.max(1)));
    json!({
        "success": true,
        "data": data,
        "pagination": {"page": page, "limit": limit, "total": total, "totalPages": total_pages}
    })
}

/// Backend user record.
#[must_use]
pub fn user_json(id: &str, name: &str, email: &str) -> Value {
    json!({"_id": id, "name": name, "email": email, "role": "customer"})
}

/// Backend product record.
#[must_use]
pub fn product_json(id: &str, name: &str, price: u32, stock: u32) -> Value {
    json!({
        "_id": id,
        "name": name,
        "price": price,
        "stock": stock,
        "category": {"_id": "c1", "name": "Burger"},
        "isActive": true
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_paged_rounds_up() {
        let body = paged(json!([]), 1, 10, 21);
        assert_eq!(body["pagination"]["totalPages"], 3);
    }

    #[test]
    fn test_jwt_has_three_segments() {
        let token = jwt("u1", Utc::now());
        assert_eq!(token.split('.').count(), 3);
    }
}
