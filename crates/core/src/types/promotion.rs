//! Promotions and coupon arithmetic.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::PromotionId;

/// How a coupon's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `value` is a percentage of the subtotal.
    Percentage,
    /// `value` is an amount in the shop currency.
    Fixed,
}

/// Why a coupon cannot be applied to a cart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    #[error("mã giảm giá không còn hiệu lực")]
    Inactive,
    #[error("mã giảm giá chưa đến thời gian áp dụng")]
    NotStarted,
    #[error("mã giảm giá đã hết hạn")]
    Expired,
    #[error("đơn hàng tối thiểu {minimum} để dùng mã này")]
    BelowMinimum { minimum: Decimal },
    #[error("mã giảm giá đã hết lượt sử dụng")]
    UsageExhausted,
}

/// A coupon or promotion redeemable by code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    #[serde(alias = "_id")]
    pub id: PromotionId,
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    #[serde(alias = "discountValue")]
    pub value: Decimal,
    #[serde(default)]
    pub min_order_value: Option<Decimal>,
    #[serde(default, alias = "maxDiscountAmount")]
    pub max_discount: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

impl Promotion {
    /// Discount this coupon grants on `subtotal`.
    ///
    /// Percentage: `min(subtotal * value / 100, subtotal)`. Fixed:
    /// `min(value, subtotal)`. A configured `max_discount` caps either.
    #[must_use]
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let raw = match self.discount_type {
            DiscountType::Percentage => subtotal * self.value / Decimal::ONE_HUNDRED,
            DiscountType::Fixed => self.value,
        };

        let mut discount = raw.max(Decimal::ZERO).min(subtotal);
        if let Some(cap) = self.max_discount {
            discount = discount.min(cap);
        }
        discount
    }

    /// Whether `now` falls inside the validity window.
    #[must_use]
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.start_date.is_none_or(|start| now >= start)
            && self.end_date.is_none_or(|end| now <= end)
    }

    /// Check every precondition for applying the coupon.
    ///
    /// # Errors
    ///
    /// Returns the first [`CouponRejection`] that applies.
    pub fn check_applicable(
        &self,
        subtotal: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), CouponRejection> {
        if !self.is_active {
            return Err(CouponRejection::Inactive);
        }
        if self.start_date.is_some_and(|start| now < start) {
            return Err(CouponRejection::NotStarted);
        }
        if self.end_date.is_some_and(|end| now > end) {
            return Err(CouponRejection::Expired);
        }
        if let Some(limit) = self.usage_limit
            && self.used_count >= limit
        {
            return Err(CouponRejection::UsageExhausted);
        }
        if let Some(minimum) = self.min_order_value
            && subtotal < minimum
        {
            return Err(CouponRejection::BelowMinimum { minimum });
        }
        Ok(())
    }

    /// Short label such as `-20%` or `-30000`.
    #[must_use]
    pub fn value_label(&self) -> String {
        match self.discount_type {
            DiscountType::Percentage => format!("-{}%", self.value.normalize()),
            DiscountType::Fixed => format!("-{}", self.value.normalize()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn coupon(discount_type: DiscountType, value: i64) -> Promotion {
        Promotion {
            id: PromotionId::new("promo"),
            code: "FASTBITE".to_string(),
            name: None,
            description: None,
            discount_type,
            value: Decimal::from(value),
            min_order_value: None,
            max_discount: None,
            start_date: None,
            end_date: None,
            usage_limit: None,
            used_count: 0,
            is_active: true,
        }
    }

    #[test]
    fn test_percentage_discount() {
        let promo = coupon(DiscountType::Percentage, 20);
        assert_eq!(promo.discount_for(Decimal::from(150_000)), Decimal::from(30_000));
    }

    #[test]
    fn test_percentage_over_hundred_is_capped_at_subtotal() {
        let promo = coupon(DiscountType::Percentage, 150);
        assert_eq!(promo.discount_for(Decimal::from(80_000)), Decimal::from(80_000));
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let promo = coupon(DiscountType::Fixed, 50_000);
        assert_eq!(promo.discount_for(Decimal::from(30_000)), Decimal::from(30_000));
        assert_eq!(promo.discount_for(Decimal::from(90_000)), Decimal::from(50_000));
    }

    #[test]
    fn test_max_discount_cap() {
        let mut promo = coupon(DiscountType::Percentage, 50);
        promo.max_discount = Some(Decimal::from(40_000));
        assert_eq!(promo.discount_for(Decimal::from(200_000)), Decimal::from(40_000));
    }

    #[test]
    fn test_zero_subtotal() {
        let promo = coupon(DiscountType::Fixed, 10_000);
        assert_eq!(promo.discount_for(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_check_applicable_window() {
        let now = Utc::now();
        let mut promo = coupon(DiscountType::Fixed, 10_000);

        promo.end_date = Some(now - Duration::days(1));
        assert_eq!(
            promo.check_applicable(Decimal::from(100_000), now),
            Err(CouponRejection::Expired)
        );

        promo.end_date = None;
        promo.start_date = Some(now + Duration::hours(2));
        assert_eq!(
            promo.check_applicable(Decimal::from(100_000), now),
            Err(CouponRejection::NotStarted)
        );
    }

    #[test]
    fn test_check_applicable_minimum_and_usage() {
        let now = Utc::now();
        let mut promo = coupon(DiscountType::Fixed, 10_000);
        promo.min_order_value = Some(Decimal::from(100_000));
        assert!(matches!(
            promo.check_applicable(Decimal::from(99_000), now),
            Err(CouponRejection::BelowMinimum { .. })
        ));

        promo.usage_limit = Some(3);
        promo.used_count = 3;
        assert_eq!(
            promo.check_applicable(Decimal::from(120_000), now),
            Err(CouponRejection::UsageExhausted)
        );
    }

    #[test]
    fn test_deserialize_backend_coupon() {
        let json = r#"{
            "_id": "c1",
            "code": "GIAM20",
            "discountType": "percentage",
            "discountValue": 20,
            "maxDiscountAmount": 50000,
            "endDate": "2030-01-01T00:00:00Z"
        }"#;
        let promo: Promotion = serde_json::from_str(json).expect("deserialize");
        assert_eq!(promo.value, Decimal::from(20));
        assert_eq!(promo.max_discount, Some(Decimal::from(50_000)));
        assert_eq!(promo.value_label(), "-20%");
    }
}
