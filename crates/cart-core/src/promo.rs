//! # Promotions
//!
//! Promo codes resolve to a discount rule through [`PromotionLookup`].
//! [`PromoTable`] is the configured, in-process implementation; anything
//! backed by an external promotions service can implement the trait instead.

use crate::money::{Currency, Price};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a promo code reduces the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromoRule {
    /// Percentage of the subtotal, in basis points (1000 = 10%)
    Percentage { basis_points: u32 },
    /// Fixed amount off, in the smallest currency unit
    Flat { amount: i64 },
}

impl PromoRule {
    /// Discount this rule grants on `subtotal`
    pub fn discount_for(&self, subtotal: Price) -> Price {
        match *self {
            PromoRule::Percentage { basis_points } => subtotal.percent(basis_points),
            PromoRule::Flat { amount } => Price::from_minor(amount.max(0), subtotal.currency),
        }
    }

    /// Short human description (e.g., "10% off", "₹500.00 off")
    pub fn describe(&self, currency: Currency) -> String {
        match *self {
            PromoRule::Percentage { basis_points } => {
                if basis_points % 100 == 0 {
                    format!("{}% off", basis_points / 100)
                } else {
                    format!("{:.2}% off", basis_points as f64 / 100.0)
                }
            }
            PromoRule::Flat { amount } => {
                format!("{} off", Price::from_minor(amount, currency).display())
            }
        }
    }
}

/// Resolves a promo code to its rule
pub trait PromotionLookup {
    /// `None` means the code is not recognised
    fn lookup(&self, code: &str) -> Option<PromoRule>;
}

/// A configured promo code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCode {
    pub code: String,
    #[serde(flatten)]
    pub rule: PromoRule,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl PromoCode {
    pub fn new(code: impl Into<String>, rule: PromoRule) -> Self {
        Self {
            code: code.into(),
            rule,
            active: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PromoFile {
    #[serde(default)]
    promotions: Vec<PromoCode>,
}

/// Table of promo codes, matched case-insensitively after trimming
#[derive(Debug, Clone, Default)]
pub struct PromoTable {
    codes: HashMap<String, PromoCode>,
}

impl PromoTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two codes the storefront has always offered
    pub fn storefront_defaults() -> Self {
        Self::new()
            .with_code(PromoCode::new(
                "SAVE10",
                PromoRule::Percentage { basis_points: 1000 },
            ))
            .with_code(PromoCode::new("FLAT500", PromoRule::Flat { amount: 50_000 }))
    }

    /// Register a code, replacing any entry with the same normalized code
    pub fn insert(&mut self, promo: PromoCode) {
        self.codes.insert(normalize_code(&promo.code), promo);
    }

    /// Builder: register a code
    pub fn with_code(mut self, promo: PromoCode) -> Self {
        self.insert(promo);
        self
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Load promotions from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let file: PromoFile = toml::from_str(toml_str)?;
        let mut table = Self::new();
        for promo in file.promotions {
            table.insert(promo);
        }
        Ok(table)
    }
}

impl PromotionLookup for PromoTable {
    fn lookup(&self, code: &str) -> Option<PromoRule> {
        self.codes
            .get(&normalize_code(code))
            .filter(|p| p.active)
            .map(|p| p.rule)
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
