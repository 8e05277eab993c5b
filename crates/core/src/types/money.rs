//! Amounts as reported by the payment provider.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currencies whose smallest unit equals the major unit (no decimals).
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd", "vuv",
    "xaf", "xof", "xpf",
];

/// An amount in the currency's smallest unit (cents for USD).
///
/// The payment provider reports every amount this way; conversion to a
/// decimal is only done for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units.
    pub amount_minor: i64,
    /// Lowercase ISO 4217 code, as the payment provider returns it.
    pub currency: String,
}

impl Money {
    /// Create an amount from minor units and a currency code.
    #[must_use]
    pub fn new(amount_minor: i64, currency: &str) -> Self {
        Self {
            amount_minor,
            currency: currency.to_ascii_lowercase(),
        }
    }

    /// Number of decimal places for this currency.
    #[must_use]
    pub fn exponent(&self) -> u32 {
        if ZERO_DECIMAL_CURRENCIES.contains(&self.currency.as_str()) {
            0
        } else {
            2
        }
    }

    /// The amount in major units (e.g. dollars).
    #[must_use]
    pub fn major(&self) -> Decimal {
        Decimal::new(self.amount_minor, self.exponent())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self.currency.as_str() {
            "usd" | "cad" | "aud" => "$",
            "eur" => "€",
            "gbp" => "£",
            _ => "",
        };
        if symbol.is_empty() {
            write!(f, "{} {}", self.major(), self.currency.to_ascii_uppercase())
        } else {
            write!(f, "{symbol}{}", self.major())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimal_currency() {
        assert_eq!(Money::new(4999, "USD").to_string(), "$49.99");
        assert_eq!(Money::new(100, "gbp").to_string(), "£1.00");
    }

    #[test]
    fn test_display_zero_decimal_currency() {
        assert_eq!(Money::new(1500, "jpy").to_string(), "1500 JPY");
    }

    #[test]
    fn test_major_units() {
        assert_eq!(Money::new(12_345, "eur").major(), Decimal::new(12_345, 2));
    }
}
