//! # Order Types
//!
//! The snapshot handed to the checkout/payment initiator: the cart's lines
//! and totals frozen at checkout, plus where and how the shopper wants it.

use crate::cart::{Cart, CartLine};
use crate::error::{CartError, CartResult};
use crate::money::Price;
use crate::pricing::PricingResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static ORDER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Delivery address collected at checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl ShippingAddress {
    /// All fields are required; pincode is six digits
    pub fn validate(&self) -> CartResult<()> {
        let required = [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("pincode", &self.pincode),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(CartError::InvalidAddress(format!("{} is required", field)));
        }

        if !self.email.contains('@') {
            return Err(CartError::InvalidAddress(format!(
                "email is not valid: {}",
                self.email
            )));
        }

        let pincode = self.pincode.trim();
        if pincode.len() != 6 || !pincode.chars().all(|c| c.is_ascii_digit()) {
            return Err(CartError::InvalidAddress(format!(
                "pincode must be 6 digits: {}",
                self.pincode
            )));
        }

        Ok(())
    }
}

/// How the shopper pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Hosted checkout widget
    Online,
    /// Pay the courier
    CashOnDelivery,
}

impl PaymentMethod {
    /// Provider name of the strategy that handles this method
    pub fn provider(&self) -> &'static str {
        match self {
            PaymentMethod::Online => "mock_gateway",
            PaymentMethod::CashOnDelivery => "cod",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Online
    }
}

/// Order lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created at checkout, waiting on the payment result
    PendingPayment,
    /// Paid (or COD accepted); the cart has been cleared
    Confirmed,
    /// Payment reported as failed; the shopper may retry
    PaymentFailed,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::PendingPayment
    }
}

/// An order created from a cart at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order ID ("ORD" + creation time in millis + sequence)
    pub id: String,

    /// Browsing session the cart belonged to
    pub session_id: String,

    /// Cart lines at checkout
    pub lines: Vec<CartLine>,

    /// Totals at checkout
    pub pricing: PricingResult,

    pub shipping_address: ShippingAddress,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    #[serde(default)]
    pub status: OrderStatus,

    /// Provider payment reference once confirmed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,

    /// Last failure reported by the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Freeze a cart into an order.
    ///
    /// `pricing` must have been computed from this cart.
    pub fn from_cart(
        session_id: impl Into<String>,
        cart: &Cart,
        pricing: PricingResult,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> CartResult<Self> {
        if cart.is_empty() {
            return Err(CartError::EmptyCart);
        }
        if pricing.subtotal != cart.subtotal() {
            return Err(CartError::InvalidRequest(
                "totals do not match the cart".to_string(),
            ));
        }
        shipping_address.validate()?;

        let now = Utc::now();
        let seq = ORDER_SEQ.fetch_add(1, Ordering::Relaxed) % 10_000;
        Ok(Self {
            id: format!("ORD{}{:04}", now.timestamp_millis(), seq),
            session_id: session_id.into(),
            lines: cart.lines().to_vec(),
            pricing,
            shipping_address,
            payment_method,
            status: OrderStatus::PendingPayment,
            payment_id: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Amount the payment provider must collect
    pub fn amount_due(&self) -> Price {
        self.pricing.total
    }

    /// Item count
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| l.quantity as u64).sum()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, OrderStatus::PendingPayment | OrderStatus::PaymentFailed)
    }

    /// Record a successful payment
    pub fn confirm(&mut self, payment_id: impl Into<String>) -> CartResult<()> {
        if !self.is_pending() {
            return Err(CartError::InvalidOrderState {
                order_id: self.id.clone(),
                message: "order is already confirmed".to_string(),
            });
        }
        self.status = OrderStatus::Confirmed;
        self.payment_id = Some(payment_id.into());
        self.failure_reason = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record a failed payment; the order stays payable
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> CartResult<()> {
        if !self.is_pending() {
            return Err(CartError::InvalidOrderState {
                order_id: self.id.clone(),
                message: "order is already confirmed".to_string(),
            });
        }
        self.status = OrderStatus::PaymentFailed;
        self.failure_reason = Some(reason.into());
        self.updated_at = Utc::now();
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::address;
    use super::*;
    use crate::money::Currency;
    use crate::pricing::PricingConfig;
    use crate::promo::PromoTable;

    fn cart() -> Cart {
        let mut cart = Cart::new(Currency::INR);
        cart.add_item(
            CartLine::new("sofa-1", "Sofa", Price::new(45999.0, Currency::INR), "img.jpg")
                .with_quantity(2),
        )
        .unwrap();
        cart
    }

    fn pricing(cart: &Cart) -> PricingResult {
        cart.compute_totals(None, &PricingConfig::default(), &PromoTable::new())
    }

    #[test]
    fn test_address_validation() {
        assert!(address().validate().is_ok());

        let mut missing = address();
        missing.city = " ".into();
        assert!(matches!(missing.validate(), Err(CartError::InvalidAddress(_))));

        let mut pincode = address();
        pincode.pincode = "5600".into();
        assert!(pincode.validate().is_err());

        let mut email = address();
        email.email = "asha.example.in".into();
        assert!(email.validate().is_err());
    }

    #[test]
    fn test_order_from_cart() {
        let cart = cart();
        let order = Order::from_cart("s1", &cart, pricing(&cart), address(), PaymentMethod::Online)
            .unwrap();

        assert!(order.id.starts_with("ORD"));
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.amount_due(), Price::new(91998.0, Currency::INR));
        assert_eq!(order.status, OrderStatus::PendingPayment);
    }

    #[test]
    fn test_order_ids_are_distinct() {
        let cart = cart();
        let a = Order::from_cart("s1", &cart, pricing(&cart), address(), PaymentMethod::Online)
            .unwrap();
        let b = Order::from_cart("s1", &cart, pricing(&cart), address(), PaymentMethod::Online)
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_empty_cart_cannot_check_out() {
        let empty = Cart::new(Currency::INR);
        let result = Order::from_cart(
            "s1",
            &empty,
            pricing(&empty),
            address(),
            PaymentMethod::CashOnDelivery,
        );
        assert!(matches!(result, Err(CartError::EmptyCart)));
    }

    #[test]
    fn test_stale_pricing_rejected() {
        let cart = cart();
        let stale = pricing(&Cart::new(Currency::INR));
        let result = Order::from_cart("s1", &cart, stale, address(), PaymentMethod::Online);
        assert!(matches!(result, Err(CartError::InvalidRequest(_))));
    }

    #[test]
    fn test_status_transitions() {
        let cart = cart();
        let mut order =
            Order::from_cart("s1", &cart, pricing(&cart), address(), PaymentMethod::Online)
                .unwrap();

        order.mark_failed("card declined").unwrap();
        assert_eq!(order.status, OrderStatus::PaymentFailed);
        assert!(order.is_pending());

        order.confirm("pay_123").unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.payment_id.as_deref(), Some("pay_123"));
        assert!(order.failure_reason.is_none());

        assert!(matches!(
            order.confirm("pay_456"),
            Err(CartError::InvalidOrderState { .. })
        ));
    }

    #[test]
    fn test_payment_method_provider() {
        assert_eq!(PaymentMethod::Online.provider(), "mock_gateway");
        assert_eq!(PaymentMethod::CashOnDelivery.provider(), "cod");
    }
}
