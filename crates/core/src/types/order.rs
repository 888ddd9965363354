//! Orders, line items, and order totals.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::Cart;
use super::id::{OrderId, ProductId};
use super::status::{OrderStatus, PaymentMethod, PaymentStatus};

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub shipping_fee: Decimal,
    pub total_amount: Decimal,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Customers may cancel until the kitchen hands the order to a driver.
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// Human-facing reference, falling back to the document id.
    #[must_use]
    pub fn reference(&self) -> &str {
        self.order_number.as_deref().unwrap_or(self.id.as_str())
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// A line on an order, priced at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(alias = "product")]
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
}

/// Delivery details collected at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl ShippingAddress {
    /// Returns the names of required fields that are blank, plus `phone` when
    /// it is not 9-11 digits.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.full_name.trim().is_empty() {
            missing.push("fullName");
        }
        let digits = self.phone.chars().filter(char::is_ascii_digit).count();
        if !(9..=11).contains(&digits) {
            missing.push("phone");
        }
        if self.address.trim().is_empty() {
            missing.push("address");
        }
        missing
    }
}

/// Price breakdown of a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Combine the parts. The discount is capped at the subtotal and the
    /// total never drops below zero.
    #[must_use]
    pub fn compute(subtotal: Decimal, discount: Decimal, shipping_fee: Decimal) -> Self {
        let discount = discount.max(Decimal::ZERO).min(subtotal);
        let total = (subtotal - discount + shipping_fee).max(Decimal::ZERO);
        Self {
            subtotal,
            discount,
            shipping_fee,
            total,
        }
    }

    /// Totals for a cart with no discount applied.
    #[must_use]
    pub fn for_cart(cart: &Cart, shipping_fee: Decimal) -> Self {
        Self::compute(cart.subtotal(), Decimal::ZERO, shipping_fee)
    }
}
