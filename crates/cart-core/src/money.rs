//! # Money Types
//!
//! Currency and price types for the cart engine.
//! Amounts are always held in the smallest currency unit (paise for INR),
//! so subtotals and discounts never drift the way floating point does.

use crate::error::{CartError, CartResult};
use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    INR,
    USD,
    EUR,
    GBP,
    JPY,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::INR => "inr",
            Currency::USD => "usd",
            Currency::EUR => "eur",
            Currency::GBP => "gbp",
            Currency::JPY => "jpy",
        }
    }

    /// Returns the display symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::INR => "₹",
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "¥",
        }
    }

    /// Returns the number of decimal places for this currency
    /// (JPY has 0 decimals, the rest have 2)
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Convert a decimal amount to the smallest currency unit (paise, cents)
    pub fn to_smallest_unit(&self, amount: f64) -> i64 {
        let multiplier = 10_f64.powi(self.decimal_places() as i32);
        (amount * multiplier).round() as i64
    }

    /// Convert from smallest unit back to decimal
    pub fn from_smallest_unit(&self, amount: i64) -> f64 {
        let divisor = 10_f64.powi(self.decimal_places() as i32);
        amount as f64 / divisor
    }

    /// Parse an ISO code, case-insensitively
    pub fn parse(code: &str) -> CartResult<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "inr" => Ok(Currency::INR),
            "usd" => Ok(Currency::USD),
            "eur" => Ok(Currency::EUR),
            "gbp" => Ok(Currency::GBP),
            "jpy" => Ok(Currency::JPY),
            other => Err(CartError::Configuration(format!(
                "unsupported currency: {}",
                other
            ))),
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::INR
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Price with amount in smallest currency unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    /// Amount in smallest currency unit (paise for INR)
    pub amount: i64,
    /// Currency
    pub currency: Currency,
}

impl Price {
    /// Create a new price from decimal amount
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self {
            amount: currency.to_smallest_unit(amount),
            currency,
        }
    }

    /// Create a price from the smallest unit
    pub fn from_minor(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Zero in the given currency
    pub fn zero(currency: Currency) -> Self {
        Self::from_minor(0, currency)
    }

    /// Get the decimal amount
    pub fn as_decimal(&self) -> f64 {
        self.currency.from_smallest_unit(self.amount)
    }

    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }

    /// Format for display (e.g., "₹2999.00")
    pub fn display(&self) -> String {
        if self.currency.decimal_places() == 0 {
            format!("{}{}", self.currency.symbol(), self.amount)
        } else {
            format!("{}{:.2}", self.currency.symbol(), self.as_decimal())
        }
    }

    /// Multiply by a quantity, saturating at the representable bounds
    pub fn times(&self, quantity: u32) -> Price {
        Price::from_minor(self.amount.saturating_mul(quantity as i64), self.currency)
    }

    /// A percentage of this price, in basis points (1000 = 10%).
    ///
    /// Rounds half away from zero to the nearest minor unit.
    pub fn percent(&self, basis_points: u32) -> Price {
        let scaled = self.amount as i128 * basis_points as i128;
        let quotient = scaled / 10_000;
        let remainder = scaled % 10_000;
        let rounded = if remainder.abs() * 2 >= 10_000 {
            quotient + scaled.signum()
        } else {
            quotient
        };
        let amount = rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        Price::from_minor(amount, self.currency)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}
