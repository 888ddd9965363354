//! Admin channel events and their toast text.

use fastbite_core::{CurrencyCode, OrderId, OrderStatus, PaymentMethod, Price, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNotice {
    #[serde(alias = "_id")]
    pub order_id: OrderId,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub customer_name: Option<String>,
}

impl OrderNotice {
    #[must_use]
    pub fn reference(&self) -> &str {
        self.order_number
            .as_deref()
            .unwrap_or_else(|| self.order_id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNotice {
    pub order_id: OrderId,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PaymentNotice {
    #[must_use]
    pub fn reference(&self) -> &str {
        self.order_number
            .as_deref()
            .unwrap_or_else(|| self.order_id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewNotice {
    #[serde(alias = "product")]
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockNotice {
    #[serde(alias = "_id")]
    pub product_id: ProductId,
    #[serde(alias = "name")]
    pub product_name: String,
    pub stock: u32,
}

/// Something happened in the shop that an operator should see.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminEvent {
    OrderCreated(OrderNotice),
    OrderUpdated(OrderNotice),
    OrderCancelled(OrderNotice),
    PaymentCompleted(PaymentNotice),
    PaymentFailed(PaymentNotice),
    ReviewCreated(ReviewNotice),
    ProductLowStock(StockNotice),
    Unknown { name: String, payload: Value },
}

impl AdminEvent {
    /// Build an event from a Socket.IO event name and its first argument.
    ///
    /// Unrecognized names and payloads that do not match the expected shape
    /// come back as `Unknown`.
    #[must_use]
    pub fn parse(name: &str, payload: Value) -> Self {
        let parsed = match name {
            "order:created" => decode(&payload).map(Self::OrderCreated),
            "order:updated" => decode(&payload).map(Self::OrderUpdated),
            "order:cancelled" => decode(&payload).map(Self::OrderCancelled),
            "payment:completed" => decode(&payload).map(Self::PaymentCompleted),
            "payment:failed" => decode(&payload).map(Self::PaymentFailed),
            "review:created" => decode(&payload).map(Self::ReviewCreated),
            "product:low_stock" => decode(&payload).map(Self::ProductLowStock),
            _ => None,
        };
        parsed.unwrap_or_else(|| Self::Unknown {
            name: name.to_string(),
            payload,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::OrderCreated(_) => "order:created",
            Self::OrderUpdated(_) => "order:updated",
            Self::OrderCancelled(_) => "order:cancelled",
            Self::PaymentCompleted(_) => "payment:completed",
            Self::PaymentFailed(_) => "payment:failed",
            Self::ReviewCreated(_) => "review:created",
            Self::ProductLowStock(_) => "product:low_stock",
            Self::Unknown { name, .. } => name,
        }
    }

    /// Toast text shown in the dashboard.
    #[must_use]
    pub fn toast(&self) -> String {
        match self {
            Self::OrderCreated(order) => {
                let mut text = format!("Đơn hàng mới #{}", order.reference());
                if let Some(name) = &order.customer_name {
                    text.push_str(&format!(" từ {name}"));
                }
                if let Some(total) = order.total_amount {
                    text.push_str(&format!(" ({})", Price::new(total, CurrencyCode::VND)));
                }
                text
            }
            Self::OrderUpdated(order) => match order.status {
                Some(status) => format!(
                    "Đơn hàng #{} chuyển sang: {}",
                    order.reference(),
                    status.label()
                ),
                None => format!("Đơn hàng #{} đã được cập nhật", order.reference()),
            },
            Self::OrderCancelled(order) => format!("Đơn hàng #{} đã bị hủy", order.reference()),
            Self::PaymentCompleted(payment) => {
                format!("Đơn hàng #{} đã thanh toán thành công", payment.reference())
            }
            Self::PaymentFailed(payment) => {
                let mut text = format!("Thanh toán đơn hàng #{} thất bại", payment.reference());
                if let Some(reason) = &payment.message {
                    text.push_str(&format!(": {reason}"));
                }
                text
            }
            Self::ReviewCreated(review) => format!(
                "Đánh giá mới {}★ cho {}",
                review.rating,
                review
                    .product_name
                    .as_deref()
                    .unwrap_or_else(|| review.product_id.as_str())
            ),
            Self::ProductLowStock(stock) => format!(
                "Sản phẩm {} sắp hết hàng (còn {})",
                stock.product_name, stock.stock
            ),
            Self::Unknown { name, .. } => format!("Sự kiện mới: {name}"),
        }
    }
}

fn decode<T: DeserializeOwned>(payload: &Value) -> Option<T> {
    T::deserialize(payload)
        .map_err(|e| warn!(error = %e, "Unexpected admin event payload"))
        .ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_order_created_toast() {
        let event = AdminEvent::parse(
            "order:created",
            json!({"_id": "o1", "orderNumber": "FB1001", "totalAmount": 125000, "customerName": "An"}),
        );
        assert_eq!(event.name(), "order:created");
        assert_eq!(event.toast(), "Đơn hàng mới #FB1001 từ An (125.000 ₫)");
    }

    #[test]
    fn test_order_updated_uses_status_label() {
        let event = AdminEvent::parse(
            "order:updated",
            json!({"orderId": "o1", "status": "shipping"}),
        );
        assert_eq!(event.toast(), "Đơn hàng #o1 chuyển sang: Đang giao");
    }

    #[test]
    fn test_payment_and_stock_events() {
        let failed = AdminEvent::parse(
            "payment:failed",
            json!({"orderId": "o2", "paymentMethod": "momo", "message": "Hết hạn"}),
        );
        assert_eq!(failed.toast(), "Thanh toán đơn hàng #o2 thất bại: Hết hạn");

        let low = AdminEvent::parse(
            "product:low_stock",
            json!({"_id": "p1", "name": "Gà rán", "stock": 3}),
        );
        assert_eq!(low.toast(), "Sản phẩm Gà rán sắp hết hàng (còn 3)");
    }

    #[test]
    fn test_unknown_and_mismatched_events() {
        let unknown = AdminEvent::parse("user:registered", json!({"id": "u1"}));
        assert_eq!(unknown.name(), "user:registered");
        assert_eq!(unknown.toast(), "Sự kiện mới: user:registered");

        let bad = AdminEvent::parse("review:created", json!({"rating": "five"}));
        assert!(matches!(bad, AdminEvent::Unknown { ref name, .. } if name == "review:created"));
    }
}
