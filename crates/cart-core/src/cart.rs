//! # Cart
//!
//! The shopping cart: an ordered list of lines keyed by
//! `(product_id, variant)`. Adding an existing key merges quantities;
//! the same product in another colour or size is a separate line.

use crate::error::{CartError, CartResult};
use crate::money::{Currency, Price};
use crate::pricing::{self, PricingConfig, PricingResult};
use crate::product::Product;
use crate::promo::PromotionLookup;
use serde::{Deserialize, Serialize};

/// Sentinel used for a variant dimension the product does not have
pub const DEFAULT_OPTION: &str = "Default";

/// A (colour, size) selection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default = "default_option")]
    pub color: String,
    #[serde(default = "default_option")]
    pub size: String,
}

fn default_option() -> String {
    DEFAULT_OPTION.to_string()
}

impl Variant {
    /// Blank values collapse to the sentinel, so `""` and `"Default"` key the same line
    pub fn new(color: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            color: normalize_option(color.into()),
            size: normalize_option(size.into()),
        }
    }

    /// Build from optional request parameters
    pub fn from_options(color: Option<&str>, size: Option<&str>) -> Self {
        Self::new(color.unwrap_or_default(), size.unwrap_or_default())
    }

    pub fn is_default(&self) -> bool {
        self.color == DEFAULT_OPTION && self.size == DEFAULT_OPTION
    }
}

impl Default for Variant {
    fn default() -> Self {
        Self {
            color: default_option(),
            size: default_option(),
        }
    }
}

fn normalize_option(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default_option()
    } else {
        trimmed.to_string()
    }
}

/// One line in the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Catalog product ID (reference only, never dereferenced)
    pub product_id: String,

    /// Product name (denormalized for display)
    pub name: String,

    /// Unit price at the moment the product was added
    pub unit_price: Price,

    /// Image URL snapshot
    #[serde(default)]
    pub image_url: String,

    /// Quantity, at least 1
    pub quantity: u32,

    /// Selected colour/size
    #[serde(default)]
    pub variant: Variant,
}

impl CartLine {
    /// Create a line with quantity 1 and the default variant
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Price,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            image_url: image_url.into(),
            quantity: 1,
            variant: Variant::default(),
        }
    }

    /// Snapshot a catalog product
    pub fn from_product(product: &Product, quantity: u32, variant: Variant) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            image_url: product.image_url.clone().unwrap_or_default(),
            quantity,
            variant,
        }
    }

    /// Builder: set quantity
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Builder: set variant
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Unit price times quantity
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }

    /// Whether this line is keyed by `(product_id, variant)`
    pub fn matches(&self, product_id: &str, variant: &Variant) -> bool {
        self.product_id == product_id && &self.variant == variant
    }

    fn validate(&self, currency: Currency) -> CartResult<()> {
        if self.unit_price.is_negative() {
            return Err(CartError::InvalidPrice {
                message: format!(
                    "unit price for {} must not be negative (got {})",
                    self.product_id,
                    self.unit_price.display()
                ),
            });
        }
        if self.quantity == 0 {
            return Err(CartError::InvalidQuantity {
                message: format!("quantity for {} must be at least 1", self.product_id),
            });
        }
        if self.unit_price.currency != currency {
            return Err(CartError::CurrencyMismatch {
                expected: currency.to_string(),
                found: self.unit_price.currency.to_string(),
            });
        }
        Ok(())
    }
}

/// The ordered collection of lines for one browsing session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    currency: Currency,
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart priced in `currency`
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            lines: Vec::new(),
        }
    }

    /// Rebuild a cart from persisted lines.
    ///
    /// Lines that would be rejected by `add_item` are dropped and duplicate
    /// keys are merged, so a tampered or stale snapshot still yields a valid cart.
    pub fn restore(currency: Currency, lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new(currency);
        for line in lines {
            let product_id = line.product_id.clone();
            if let Err(e) = cart.add_item(line) {
                tracing::warn!("Dropping persisted cart line {}: {}", product_id, e);
            }
        }
        cart
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Lines in insertion order
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Find the line for `(product_id, variant)`
    pub fn line(&self, product_id: &str, variant: &Variant) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(product_id, variant))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add a line, merging into an existing line with the same key.
    ///
    /// Rejects negative prices, zero quantities and foreign currencies;
    /// a rejected call leaves the cart untouched.
    pub fn add_item(&mut self, line: CartLine) -> CartResult<()> {
        line.validate(self.currency)?;

        match self
            .lines
            .iter_mut()
            .find(|l| l.matches(&line.product_id, &line.variant))
        {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(line.quantity).ok_or_else(
                    || CartError::InvalidQuantity {
                        message: format!("quantity for {} overflows", line.product_id),
                    },
                )?;
            }
            None => self.lines.push(line),
        }
        Ok(())
    }

    /// Remove a line entirely. Returns whether a line was removed.
    pub fn remove_item(&mut self, product_id: &str, variant: &Variant) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| !l.matches(product_id, variant));
        self.lines.len() != before
    }

    /// Overwrite a line's quantity; zero or below removes the line.
    /// Returns whether a line was changed.
    pub fn set_quantity(&mut self, product_id: &str, variant: &Variant, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(product_id, variant);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.lines.iter_mut().find(|l| l.matches(product_id, variant)) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Empty the cart
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of quantities across all lines
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|l| l.quantity as u64).sum()
    }

    /// Sum of unit price times quantity
    pub fn subtotal(&self) -> Price {
        let amount = self
            .lines
            .iter()
            .fold(0_i64, |acc, l| acc.saturating_add(l.line_total().amount));
        Price::from_minor(amount, self.currency)
    }

    /// Derive order totals. Pure: identical inputs give identical output.
    pub fn compute_totals(
        &self,
        promo_code: Option<&str>,
        config: &PricingConfig,
        promotions: &dyn PromotionLookup,
    ) -> PricingResult {
        pricing::compute_totals(self.subtotal(), promo_code, config, promotions)
    }
}
