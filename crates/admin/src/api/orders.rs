//! Order management endpoints.

use fastbite_core::{Order, OrderId, OrderStatus, Page};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::{AdminApiError, AdminClient};

/// Filters for the order list.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusUpdate {
    status: OrderStatus,
}

impl AdminClient {
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, filter: &OrderFilter) -> Result<Page<Order>, AdminApiError> {
        let request = self.request(Method::GET, "orders")?.query(filter);
        self.execute_page(request).await
    }

    /// # Errors
    ///
    /// Returns `AdminApiError::NotFound` if the order does not exist.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, AdminApiError> {
        let request = self.request(Method::GET, &format!("orders/{id}"))?;
        self.execute_data(request, "order").await
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the transition.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, AdminApiError> {
        let request = self
            .request(Method::PUT, &format!("orders/{id}/status"))?
            .json(&StatusUpdate { status });
        self.execute_data(request, "order").await
    }
}
