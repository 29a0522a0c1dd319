//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A price with currency information.
///
/// Amounts are held in the currency's standard unit (e.g., rupees, not
/// paise); [`Price::minor_units`] converts for gateways that bill in the
/// smallest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// Amount in the smallest currency unit (amount x 100, rounded).
    ///
    /// Returns `None` if the amount does not fit in an `i64` after scaling.
    #[must_use]
    pub fn minor_units(&self) -> Option<i64> {
        (self.amount * Decimal::from(100)).round().to_i64()
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Three-letter ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            _ => Err(format!("unsupported currency code: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units() {
        let price = Price::new(Decimal::new(19999, 2), CurrencyCode::INR);
        assert_eq!(price.minor_units(), Some(19999));

        let whole = Price::new(Decimal::from(200), CurrencyCode::INR);
        assert_eq!(whole.minor_units(), Some(20000));
    }

    #[test]
    fn test_minor_units_rounds_sub_paise() {
        // 10.005 rounds to 1000 or 1001 depending on banker's rounding;
        // rust_decimal rounds half to even, so 1000.5 -> 1000
        let price = Price::new(Decimal::new(10005, 3), CurrencyCode::INR);
        assert_eq!(price.minor_units(), Some(1000));
    }

    #[test]
    fn test_currency_roundtrip() {
        let c: CurrencyCode = "INR".parse().unwrap();
        assert_eq!(c, CurrencyCode::INR);
        assert_eq!(c.to_string(), "INR");
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
