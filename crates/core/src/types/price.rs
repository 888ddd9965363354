//! Type-safe price representation using decimal arithmetic.
//!
//! The backend stores prices as plain numbers in the shop currency. Amounts
//! are kept as [`Decimal`] so totals never accumulate float error.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (dong, dollars).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Format for display, e.g. `45.000 ₫` or `$4.50`.
    #[must_use]
    pub fn display(&self) -> String {
        match self.currency_code {
            CurrencyCode::VND => {
                let rounded = self
                    .amount
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
                let grouped = group_thousands(
                    &rounded.abs().to_string(),
                    '.',
                    rounded.is_sign_negative(),
                );
                format!("{grouped} ₫")
            }
            CurrencyCode::USD => {
                let rounded = self
                    .amount
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                let sign = if rounded.is_sign_negative() { "-" } else { "" };
                format!("{sign}${:.2}", rounded.abs())
            }
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes supported by the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    VND,
    USD,
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "VND" => Ok(Self::VND),
            "USD" => Ok(Self::USD),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

fn group_thousands(digits: &str, separator: char, negative: bool) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    let len = digits.len();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    if negative {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vnd_display_groups_thousands() {
        let price = Price::new(Decimal::from(1_245_000), CurrencyCode::VND);
        assert_eq!(price.display(), "1.245.000 ₫");
    }

    #[test]
    fn test_vnd_display_small_amount() {
        let price = Price::new(Decimal::from(500), CurrencyCode::VND);
        assert_eq!(price.display(), "500 ₫");
    }

    #[test]
    fn test_usd_display() {
        let price = Price::new(Decimal::new(450, 2), CurrencyCode::USD);
        assert_eq!(price.display(), "$4.50");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("vnd".parse::<CurrencyCode>(), Ok(CurrencyCode::VND));
        assert!("EUR".parse::<CurrencyCode>().is_err());
    }
}
