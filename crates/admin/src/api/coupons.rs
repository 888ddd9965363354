//! Coupon (promotion) management endpoints.

use fastbite_core::{Page, Promotion, PromotionId};
use reqwest::Method;
use tracing::instrument;

use super::{AdminApiError, AdminClient};
use crate::forms::CouponPayload;

impl AdminClient {
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_coupons(&self, page: u32, limit: u32) -> Result<Page<Promotion>, AdminApiError> {
        let request = self
            .request(Method::GET, "promotions")?
            .query(&[("page", page), ("limit", limit)]);
        self.execute_page(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the coupon (e.g. duplicate code).
    #[instrument(skip(self, payload), fields(code = %payload.code))]
    pub async fn create_coupon(&self, payload: &CouponPayload) -> Result<Promotion, AdminApiError> {
        let request = self.request(Method::POST, "promotions")?.json(payload);
        self.execute_data(request, "promotion").await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, payload), fields(promotion_id = %id))]
    pub async fn update_coupon(
        &self,
        id: &PromotionId,
        payload: &CouponPayload,
    ) -> Result<Promotion, AdminApiError> {
        let request = self
            .request(Method::PUT, &format!("promotions/{id}"))?
            .json(payload);
        self.execute_data(request, "promotion").await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(promotion_id = %id))]
    pub async fn delete_coupon(&self, id: &PromotionId) -> Result<(), AdminApiError> {
        let request = self.request(Method::DELETE, &format!("promotions/{id}"))?;
        self.execute_unit(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::api::test_client;
    use crate::forms::CouponForm;
    use fastbite_core::CurrencyCode;

    #[tokio::test]
    async fn test_create_coupon_json_body() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/promotions").json_body(json!({
                "code": "FREESHIP",
                "discountType": "fixed",
                "value": 20000.0,
                "isActive": true
            }));
            then.status(201).json_body(json!({
                "success": true,
                "data": {"_id": "pr1", "code": "FREESHIP", "discountType": "fixed", "value": 20000}
            }));
        });

        let payload = CouponForm {
            code: "freeship".to_string(),
            discount_type: "fixed".to_string(),
            value: "20000".to_string(),
            ..CouponForm::default()
        }
        .validate(CurrencyCode::VND)
        .unwrap();

        let created = test_client(&server).create_coupon(&payload).await.unwrap();
        mock.assert();
        assert_eq!(created.code, "FREESHIP");
    }

    #[tokio::test]
    async fn test_duplicate_code_surfaces_backend_message() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/promotions");
            then.status(400)
                .json_body(json!({"success": false, "message": "Mã giảm giá đã tồn tại"}));
        });

        let payload = CouponForm {
            code: "SALE50".to_string(),
            value: "50".to_string(),
            ..CouponForm::default()
        }
        .validate(CurrencyCode::VND)
        .unwrap();

        let err = test_client(&server).create_coupon(&payload).await.unwrap_err();
        assert!(matches!(
            err,
            AdminApiError::Api { status: 400, ref message } if message == "Mã giảm giá đã tồn tại"
        ));
    }
}
