//! Payment provider endpoints.
//!
//! The backend creates the provider session and hands back a URL the
//! customer must visit. Each provider names that URL differently.

use fastbite_core::{OrderId, OrderStatus, PaymentMethod, PaymentStatus};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentRequest<'a> {
    order_id: &'a OrderId,
}

/// Raw provider response; exactly one of the URL fields is expected.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderSession {
    #[serde(default)]
    url: Option<String>,
    #[serde(default, alias = "sessionUrl")]
    checkout_url: Option<String>,
    #[serde(default)]
    pay_url: Option<String>,
    #[serde(default)]
    payment_url: Option<String>,
}

impl ProviderSession {
    fn into_url(self) -> Option<String> {
        self.url
            .or(self.checkout_url)
            .or(self.pay_url)
            .or(self.payment_url)
    }
}

/// Where to send the customer to finish paying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRedirect {
    pub method: PaymentMethod,
    pub url: String,
}

/// Body of `GET /payments/status/:orderId`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, alias = "orderStatus")]
    pub status: Option<OrderStatus>,
}

impl ApiClient {
    /// Create a provider payment session for an order.
    ///
    /// Returns `Ok(None)` for cash on delivery, which needs no redirect.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to create the session or
    /// answers without a redirect URL.
    #[instrument(skip(self), fields(order_id = %order_id, method = %method))]
    pub async fn create_payment(
        &self,
        order_id: &OrderId,
        method: PaymentMethod,
    ) -> Result<Option<PaymentRedirect>, ApiError> {
        let path = match method {
            PaymentMethod::Cod => return Ok(None),
            PaymentMethod::Stripe => "payments/stripe/create-checkout-session",
            PaymentMethod::Momo => "payments/momo/create",
            PaymentMethod::Vnpay => "payments/vnpay/create",
        };

        let request = self
            .request(Method::POST, path)
            .await?
            .json(&CreatePaymentRequest { order_id });
        let session: ProviderSession = self.execute_data(request, "payment session").await?;

        let url = session
            .into_url()
            .ok_or_else(|| ApiError::MissingData(format!("{method} redirect URL")))?;
        Ok(Some(PaymentRedirect { method, url }))
    }

    /// Current payment state of an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_payment_status(
        &self,
        order_id: &OrderId,
    ) -> Result<PaymentStatusResponse, ApiError> {
        let request = self
            .request(Method::GET, &format!("payments/status/{order_id}"))
            .await?;
        self.execute_data(request, "payment status").await
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
    async fn test_cod_needs_no_request() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|_, then| {
            then.status(500);
        });

        let redirect = test_client(&server)
            .create_payment(&OrderId::new("o1"), PaymentMethod::Cod)
            .await
            .unwrap();
        assert!(redirect.is_none());
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_url_fields() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/payments/momo/create");
            then.status(200).json_body(json!({
                "success": true,
                "data": {"payUrl": "https://test-payment.momo.vn/pay/abc"}
            }));
        });
        server.mock(|when, then| {
            when.method(POST)
                .path("/payments/vnpay/create")
                .json_body(json!({"orderId": "o1"}));
            then.status(200).json_body(json!({
                "success": true,
                "data": {"paymentUrl": "https://sandbox.vnpayment.vn/pay?x=1"}
            }));
        });
        server.mock(|when, then| {
            when.method(POST).path("/payments/stripe/create-checkout-session");
            then.status(200).json_body(json!({
                "success": true,
                "data": {"sessionId": "cs_1", "url": "https://checkout.stripe.com/c/cs_1"}
            }));
        });

        let client = test_client(&server);
        let order = OrderId::new("o1");

        let momo = client
            .create_payment(&order, PaymentMethod::Momo)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(momo.url, "https://test-payment.momo.vn/pay/abc");

        let vnpay = client
            .create_payment(&order, PaymentMethod::Vnpay)
            .await
            .unwrap()
            .unwrap();
        assert!(vnpay.url.starts_with("https://sandbox.vnpayment.vn"));

        let stripe = client
            .create_payment(&order, PaymentMethod::Stripe)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stripe.method, PaymentMethod::Stripe);
    }

    #[tokio::test]
    async fn test_missing_redirect_url() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/payments/momo/create");
            then.status(200)
                .json_body(json!({"success": true, "data": {"resultCode": 0}}));
        });

        let err = test_client(&server)
            .create_payment(&OrderId::new("o1"), PaymentMethod::Momo)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingData(_)));
    }

    #[tokio::test]
    async fn test_payment_status() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/payments/status/o1");
            then.status(200).json_body(json!({
                "success": true,
                "data": {"orderId": "o1", "paymentStatus": "paid", "paymentMethod": "stripe", "status": "processing"}
            }));
        });

        let status = test_client(&server)
            .get_payment_status(&OrderId::new("o1"))
            .await
            .unwrap();
        assert_eq!(status.payment_status, PaymentStatus::Paid);
        assert_eq!(status.status, Some(OrderStatus::Processing));
    }
}
