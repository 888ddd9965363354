//! Promotion and coupon endpoints.

use fastbite_core::Promotion;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplyCouponRequest<'a> {
    code: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    order_total: Decimal,
}

/// Result of validating a coupon against an order total.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    #[serde(default)]
    pub code: String,
    #[serde(alias = "discountAmount")]
    pub discount: Decimal,
    #[serde(default)]
    pub promotion: Option<Promotion>,
}

impl ApiClient {
    /// Promotions currently running.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_active_promotions(&self) -> Result<Vec<Promotion>, ApiError> {
        let request = self.request(Method::GET, "promotions/active").await?;
        Ok(self
            .execute::<Vec<Promotion>>(request)
            .await?
            .data
            .unwrap_or_default())
    }

    /// Ask the backend to validate `code` for an order of `order_total`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] with the backend's reason when the coupon
    /// is rejected.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn apply_coupon(
        &self,
        code: &str,
        order_total: Decimal,
    ) -> Result<AppliedCoupon, ApiError> {
        let request = self
            .request(Method::POST, "promotions/apply-coupon")
            .await?
            .json(&ApplyCouponRequest { code, order_total });
        let mut applied: AppliedCoupon = self.execute_data(request, "coupon").await?;
        if applied.code.is_empty() {
            applied.code = code.to_string();
        }
        Ok(applied)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::api::test_client;

    #[tokio::test]
    async fn test_apply_coupon_sends_total() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/promotions/apply-coupon")
                .json_body(json!({"code": "GIAM20", "orderTotal": 150_000.0}));
            then.status(200).json_body(json!({
                "success": true,
                "data": {"discount": 30000}
            }));
        });

        let applied = test_client(&server)
            .apply_coupon("GIAM20", Decimal::from(150_000))
            .await
            .unwrap();
        mock.assert();
        assert_eq!(applied.code, "GIAM20");
        assert_eq!(applied.discount, Decimal::from(30_000));
    }

    #[tokio::test]
    async fn test_apply_coupon_rejected() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/promotions/apply-coupon");
            then.status(400)
                .json_body(json!({"success": false, "message": "Mã giảm giá đã hết hạn"}));
        });

        let err = test_client(&server)
            .apply_coupon("OLD", Decimal::from(10_000))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 400, .. }));
        assert_eq!(err.server_message(), Some("Mã giảm giá đã hết hạn"));
    }
}
