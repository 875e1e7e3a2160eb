//! # cart-payments
//!
//! Payment strategies for furnistore-cart.
//!
//! This crate provides two strategies behind `cart_core::PaymentStrategy`:
//!
//! 1. **MockGatewayStrategy** - hosted checkout widget
//!    - Client opens the widget with the session's key and amount
//!    - Widget reports back a payment id or a failure reason
//!    - Best for: card/UPI/netbanking in test mode
//!
//! 2. **CashOnDeliveryStrategy** - pay the courier
//!    - Confirms immediately with a `cod_` reference
//!    - Optional order-value cap
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cart_payments::MockGatewayStrategy;
//! use cart_core::{PaymentReport, PaymentStrategy};
//!
//! let strategy = MockGatewayStrategy::from_env()?;
//!
//! // Open the widget with session.key_id and session.amount
//! let session = strategy.initiate(&order).await?;
//!
//! // Widget callback
//! let outcome = strategy.complete(&order, PaymentReport::succeeded("pay_123")).await?;
//! if outcome.is_success() {
//!     cart.clear();
//! }
//! ```

pub mod cod;
pub mod config;
pub mod gateway;

// Re-exports
pub use cod::CashOnDeliveryStrategy;
pub use config::GatewayConfig;
pub use gateway::MockGatewayStrategy;

#[cfg(test)]
pub(crate) mod test_support {
    use cart_core::{
        Cart, CartLine, Currency, Order, PaymentMethod, Price, PricingConfig, PromoTable,
        ShippingAddress,
    };

    /// A pending order for one item at `rupees`
    pub fn order_with(rupees: f64) -> Order {
        let mut cart = Cart::new(Currency::INR);
        cart.add_item(CartLine::new("item", "Item", Price::new(rupees, Currency::INR), ""))
            .unwrap();
        let pricing = cart.compute_totals(None, &PricingConfig::default(), &PromoTable::new());
        let address = ShippingAddress {
            full_name: "Ravi Kumar".into(),
            email: "ravi@example.in".into(),
            phone: "9000000000".into(),
            address: "4 Park Street".into(),
            city: "Kolkata".into(),
            state: "West Bengal".into(),
            pincode: "700016".into(),
        };
        Order::from_cart("s1", &cart, pricing, address, PaymentMethod::Online).unwrap()
    }
}
