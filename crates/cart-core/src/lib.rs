//! # cart-core
//!
//! Cart and pricing engine for the FurniStore storefront.
//!
//! This crate provides:
//! - `Cart` and `CartLine`: lines keyed by `(product_id, variant)` with quantity merging
//! - `PricingConfig` and `PricingResult`: subtotal, delivery fee, promo discount, total
//! - `PromotionLookup` and `PromoTable`: pluggable promo-code rules
//! - `CartStore` and `CartSession`: best-effort load/save around every mutation
//! - `Product` and `ProductCatalog`: the read-only catalog records carts snapshot
//! - `Order` and `PaymentStrategy`: the hand-off to checkout and payment
//! - `CartError` for typed error handling
//!
//! ## Example
//!
//! ```rust
//! use cart_core::{Cart, CartLine, Currency, Price, PricingConfig, PromoTable};
//!
//! let mut cart = Cart::new(Currency::INR);
//! let sofa = CartLine::new("sofa-1", "Sofa", Price::new(45999.0, Currency::INR), "img.jpg");
//! cart.add_item(sofa.clone()).unwrap();
//! cart.add_item(sofa.with_quantity(2)).unwrap();
//! assert_eq!(cart.total_items(), 3);
//!
//! let totals = cart.compute_totals(
//!     Some("SAVE10"),
//!     &PricingConfig::default(),
//!     &PromoTable::storefront_defaults(),
//! );
//! assert_eq!(totals.total.display(), "₹124197.30");
//! ```

pub mod cart;
pub mod error;
pub mod money;
pub mod order;
pub mod persistence;
pub mod pricing;
pub mod product;
pub mod promo;
pub mod session;
pub mod strategy;

// Re-exports for convenience
pub use cart::{Cart, CartLine, Variant, DEFAULT_OPTION};
pub use error::{CartError, CartResult};
pub use money::{Currency, Price};
pub use order::{Order, OrderStatus, PaymentMethod, ShippingAddress};
pub use persistence::{
    validate_session_id, CartStore, JsonFileCartStore, MemoryCartStore, MAX_SESSION_ID_LEN,
};
pub use pricing::{compute_totals, PricingConfig, PricingResult};
pub use product::{Product, ProductCatalog};
pub use promo::{PromoCode, PromoRule, PromoTable, PromotionLookup};
pub use session::{restore_cart, CartSession};
pub use strategy::{
    BoxedPaymentStrategy, PaymentOutcome, PaymentReport, PaymentSession, PaymentStrategy,
    PaymentStrategySelector,
};
