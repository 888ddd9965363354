//! Customer order endpoints.

use fastbite_core::{Order, OrderId, Page, PaymentMethod, ProductId, ShippingAddress};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::{ApiClient, ApiError};

/// One line of a new order. Prices are resolved by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItem {
    #[serde(rename = "product")]
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<CreateOrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ApiClient {
    /// Place an order for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order (stock, coupon,
    /// validation) or the request fails.
    #[instrument(skip(self, order), fields(items = order.items.len(), method = %order.payment_method))]
    pub async fn create_order(&self, order: &CreateOrderRequest) -> Result<Order, ApiError> {
        let request = self.request(Method::POST, "orders").await?.json(order);
        self.execute_data(request, "order").await
    }

    /// Orders of the signed-in user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_my_orders(&self, page: u32, limit: u32) -> Result<Page<Order>, ApiError> {
        let request = self
            .request(Method::GET, "orders/my-orders")
            .await?
            .query(&[("page", page), ("limit", limit)]);
        let envelope = self.execute::<Vec<Order>>(request).await?;
        let items = envelope.data.unwrap_or_default();
        Ok(match envelope.pagination {
            Some(pagination) => Page { items, pagination },
            None => Page::single(items),
        })
    }

    /// One order of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the order does not exist or belongs
    /// to someone else.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let request = self.request(Method::GET, &format!("orders/{id}")).await?;
        self.execute_data(request, "order").await
    }

    /// Cancel a pending or processing order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the cancellation.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let request = self
            .request(Method::PUT, &format!("orders/{id}/cancel"))
            .await?;
        self.execute_data(request, "order").await
    }
}
