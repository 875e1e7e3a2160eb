//! # Pricing
//!
//! Order totals derived from a cart subtotal:
//!
//! ```text
//! delivery_fee = 0 if subtotal >= free_delivery_threshold else base_delivery_fee
//! discount     = promo rule applied to subtotal (0 if no / unknown code)
//! total        = max(0, subtotal + delivery_fee - discount)
//! ```

use crate::error::{CartError, CartResult};
use crate::money::{Currency, Price};
use crate::promo::PromotionLookup;
use serde::{Deserialize, Serialize};
use std::env;

/// Delivery pricing constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Subtotal at or above which delivery is free
    pub free_delivery_threshold: Price,
    /// Fee charged below the threshold
    pub base_delivery_fee: Price,
}

impl PricingConfig {
    pub fn new(free_delivery_threshold: Price, base_delivery_fee: Price) -> Self {
        Self {
            free_delivery_threshold,
            base_delivery_fee,
        }
    }

    pub fn currency(&self) -> Currency {
        self.free_delivery_threshold.currency
    }

    /// Load from environment variables, falling back to the storefront defaults.
    ///
    /// - `CURRENCY` (default `inr`)
    /// - `FREE_DELIVERY_THRESHOLD` in major units (default 2999)
    /// - `BASE_DELIVERY_FEE` in major units (default 99)
    pub fn from_env() -> CartResult<Self> {
        let currency = match env::var("CURRENCY") {
            Ok(code) => Currency::parse(&code)?,
            Err(_) => Currency::INR,
        };
        let threshold = read_amount("FREE_DELIVERY_THRESHOLD", 2999.0, currency)?;
        let fee = read_amount("BASE_DELIVERY_FEE", 99.0, currency)?;
        Ok(Self::new(threshold, fee))
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self::new(
            Price::new(2999.0, Currency::INR),
            Price::new(99.0, Currency::INR),
        )
    }
}

fn read_amount(var: &str, default: f64, currency: Currency) -> CartResult<Price> {
    let amount = match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| CartError::Configuration(format!("{} is not a number: {}", var, raw)))?,
        Err(_) => default,
    };
    if !amount.is_finite() || amount < 0.0 {
        return Err(CartError::Configuration(format!(
            "{} must be a non-negative amount",
            var
        )));
    }
    Ok(Price::new(amount, currency))
}

/// Totals for a cart at a point in time. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub discount: Price,
    pub total: Price,
    /// False only when a code was supplied and not recognised
    pub promo_valid: bool,
    /// The normalized code that produced `discount`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    /// What the applied code gives, e.g. "10% off"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_description: Option<String>,
    /// How much more the shopper must add to get free delivery
    pub amount_to_free_delivery: Price,
}

impl PricingResult {
    pub fn has_free_delivery(&self) -> bool {
        self.delivery_fee.amount == 0
    }
}

/// Compute totals for `subtotal`.
///
/// Config amounts are read in the subtotal's currency. Pure and deterministic.
pub fn compute_totals(
    subtotal: Price,
    promo_code: Option<&str>,
    config: &PricingConfig,
    promotions: &dyn PromotionLookup,
) -> PricingResult {
    let currency = subtotal.currency;
    let threshold = config.free_delivery_threshold.amount;

    let delivery_fee = if subtotal.amount >= threshold {
        0
    } else {
        config.base_delivery_fee.amount
    };

    let code = promo_code.map(str::trim).filter(|c| !c.is_empty());
    let (discount, promo_valid, applied) = match code {
        None => (0, true, None),
        Some(code) => match promotions.lookup(code) {
            Some(rule) => (
                rule.discount_for(subtotal).amount,
                true,
                Some((code.to_ascii_uppercase(), rule.describe(currency))),
            ),
            None => (0, false, None),
        },
    };
    let (promo_code, promo_description) = applied.unzip();

    let total = subtotal
        .amount
        .saturating_add(delivery_fee)
        .saturating_sub(discount)
        .max(0);

    PricingResult {
        subtotal,
        delivery_fee: Price::from_minor(delivery_fee, currency),
        discount: Price::from_minor(discount, currency),
        total: Price::from_minor(total, currency),
        promo_valid,
        promo_code,
        promo_description,
        amount_to_free_delivery: Price::from_minor(
            threshold.saturating_sub(subtotal.amount).max(0),
            currency,
        ),
    }
}
