//! Status enums for orders and payments.
//!
//! Wire values are the lowercase strings used by the backend.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The happy-path progression used for order tracking.
    pub const TIMELINE: [Self; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Shipping,
        Self::Delivered,
    ];

    /// Wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipping => "shipping",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Customer-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Chờ xác nhận",
            Self::Processing => "Đang chuẩn bị",
            Self::Shipping => "Đang giao",
            Self::Delivered => "Đã giao",
            Self::Cancelled => "Đã hủy",
        }
    }

    /// Whether no further transitions can happen.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Tracking timeline steps with a completed flag for each.
    ///
    /// A cancelled order reports every step as incomplete.
    #[must_use]
    pub fn progress_steps(&self) -> Vec<(Self, bool)> {
        let reached = Self::TIMELINE.iter().position(|s| s == self);
        Self::TIMELINE
            .iter()
            .enumerate()
            .map(|(i, step)| (*step, reached.is_some_and(|r| i <= r)))
            .collect()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipping" => Ok(Self::Shipping),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
            Self::Failed => write!(f, "failed"),
            Self::Refunded => write!(f, "refunded"),
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cod,
    Stripe,
    Momo,
    Vnpay,
}

impl PaymentMethod {
    /// Whether paying requires a redirect to an external gateway.
    #[must_use]
    pub const fn requires_redirect(&self) -> bool {
        !matches!(self, Self::Cod)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cod => write!(f, "cod"),
            Self::Stripe => write!(f, "stripe"),
            Self::Momo => write!(f, "momo"),
            Self::Vnpay => write!(f, "vnpay"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cod" => Ok(Self::Cod),
            "stripe" => Ok(Self::Stripe),
            "momo" => Ok(Self::Momo),
            "vnpay" => Ok(Self::Vnpay),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}
