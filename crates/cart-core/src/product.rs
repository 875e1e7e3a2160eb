//! # Product Types
//!
//! Catalog records the cart engine snapshots from.
//! Products are loaded from `config/products.toml`; the engine never
//! writes back to the catalog.

use crate::cart::{Variant, DEFAULT_OPTION};
use crate::error::{CartError, CartResult};
use crate::money::Price;
use serde::{Deserialize, Serialize};

/// A product in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier (e.g., "sofa-1")
    pub id: String,

    /// Display name
    pub name: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Unit price
    pub price: Price,

    /// Primary image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Category name (e.g., "Living Room")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Whether the product can currently be bought
    #[serde(default = "default_true")]
    pub in_stock: bool,

    /// Shown on the landing page
    #[serde(default)]
    pub featured: bool,

    /// Colour options, empty when the product has no colour dimension
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,

    /// Size options, empty when the product has no size dimension
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// Create an in-stock product with no variant dimensions
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            image_url: None,
            category: None,
            in_stock: true,
            featured: false,
            colors: Vec::new(),
            sizes: Vec::new(),
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Builder: set image URL
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Builder: set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builder: set colour options
    pub fn with_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colors = colors.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set size options
    pub fn with_sizes<I, S>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sizes = sizes.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: mark out of stock
    pub fn out_of_stock(mut self) -> Self {
        self.in_stock = false;
        self
    }

    /// Turn a shopper's colour/size choice into the variant a cart line is keyed by.
    ///
    /// Dimensions the product does not have resolve to the `"Default"` sentinel.
    /// An omitted choice on a dimension the product does have picks its first option.
    /// A choice the product does not offer is rejected.
    pub fn resolve_variant(&self, color: Option<&str>, size: Option<&str>) -> CartResult<Variant> {
        let color = self.pick_option(&self.colors, color, "color")?;
        let size = self.pick_option(&self.sizes, size, "size")?;
        Ok(Variant::new(color, size))
    }

    fn pick_option(
        &self,
        options: &[String],
        requested: Option<&str>,
        dimension: &str,
    ) -> CartResult<String> {
        let requested = requested
            .map(str::trim)
            .filter(|r| !r.is_empty() && *r != DEFAULT_OPTION);

        match (options.first(), requested) {
            (None, None) => Ok(DEFAULT_OPTION.to_string()),
            (Some(first), None) => Ok(first.clone()),
            (_, Some(wanted)) => options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(wanted))
                .cloned()
                .ok_or_else(|| CartError::InvalidVariant {
                    product_id: self.id.clone(),
                    message: format!("{} '{}' is not offered", dimension, wanted),
                }),
        }
    }
}

/// Product catalog (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCatalog {
    #[serde(default)]
    pub products: Vec<Product>,
}

impl ProductCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
        }
    }

    /// Add a product to the catalog
    pub fn add(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Find a product by ID
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Get all products that can be bought right now
    pub fn in_stock_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.in_stock)
    }

    /// Get all products in a category (case-insensitive)
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products.iter().filter(move |p| {
            p.category
                .as_deref()
                .map(|c| c.eq_ignore_ascii_case(category))
                .unwrap_or(false)
        })
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn armchair() -> Product {
        Product::new("chair-7", "Wingback Armchair", Price::new(12999.0, Currency::INR))
            .with_colors(["Teal", "Mustard"])
            .with_sizes(["Standard"])
    }

    #[test]
    fn test_product_builder() {
        let product = Product::new("sofa-1", "Sofa", Price::new(45999.0, Currency::INR))
            .with_description("Three-seater")
            .with_image("img.jpg")
            .with_category("Living Room");

        assert_eq!(product.id, "sofa-1");
        assert_eq!(product.image_url.as_deref(), Some("img.jpg"));
        assert!(product.in_stock);
    }

    #[test]
    fn test_variant_defaults_without_dimensions() {
        let product = Product::new("sofa-1", "Sofa", Price::new(45999.0, Currency::INR));
        let variant = product.resolve_variant(None, None).unwrap();
        assert_eq!(variant, Variant::default());
    }

    #[test]
    fn test_variant_picks_first_option_when_omitted() {
        let variant = armchair().resolve_variant(None, None).unwrap();
        assert_eq!(variant.color, "Teal");
        assert_eq!(variant.size, "Standard");
    }

    #[test]
    fn test_variant_matches_case_insensitively() {
        let variant = armchair().resolve_variant(Some("mustard"), None).unwrap();
        assert_eq!(variant.color, "Mustard");
    }

    #[test]
    fn test_variant_rejects_unknown_option() {
        let err = armchair().resolve_variant(Some("Purple"), None).unwrap_err();
        assert!(matches!(err, CartError::InvalidVariant { .. }));

        let plain = Product::new("lamp", "Lamp", Price::new(999.0, Currency::INR));
        assert!(plain.resolve_variant(None, Some("XL")).is_err());
    }

    #[test]
    fn test_catalog_from_toml() {
        let catalog = ProductCatalog::from_toml(
            r#"
            [[products]]
            id = "sofa-1"
            name = "Sofa"
            category = "Living Room"
            price = { amount = 4599900, currency = "inr" }

            [[products]]
            id = "bed-2"
            name = "Queen Bed"
            in_stock = false
            sizes = ["Queen", "King"]
            price = { amount = 3499900, currency = "inr" }
            "#,
        )
        .unwrap();

        assert_eq!(catalog.products.len(), 2);
        assert_eq!(catalog.get("sofa-1").unwrap().price.amount, 4_599_900);
        assert_eq!(catalog.in_stock_products().count(), 1);
        assert_eq!(catalog.by_category("living room").count(), 1);
        assert!(catalog.get("missing").is_none());
    }
}
