//! # Cash on Delivery
//!
//! Nothing is collected up front: the order is confirmed as soon as the
//! shopper submits it, with a `cod_` reference in place of a payment id.

use async_trait::async_trait;
use cart_core::{
    CartError, CartResult, Order, PaymentOutcome, PaymentReport, PaymentSession, PaymentStrategy,
};
use tracing::{info, instrument};
use uuid::Uuid;

/// Cash-on-delivery strategy
#[derive(Debug, Clone)]
pub struct CashOnDeliveryStrategy {
    /// Orders above this total (minor units) must be paid online
    max_amount: Option<i64>,
}

impl CashOnDeliveryStrategy {
    pub const PROVIDER: &'static str = "cod";

    pub fn new() -> Self {
        Self { max_amount: None }
    }

    /// Builder: cap COD orders
    pub fn with_max_amount(mut self, max_amount: i64) -> Self {
        self.max_amount = Some(max_amount);
        self
    }
}

impl Default for CashOnDeliveryStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentStrategy for CashOnDeliveryStrategy {
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn initiate(&self, order: &Order) -> CartResult<PaymentSession> {
        if let Some(max) = self.max_amount {
            if order.amount_due().amount > max {
                return Err(CartError::InvalidRequest(format!(
                    "cash on delivery is not available above {}",
                    cart_core::Price::from_minor(max, order.amount_due().currency).display()
                )));
            }
        }

        let reference = format!("cod_{}", Uuid::new_v4().simple());
        Ok(PaymentSession::new(reference, order, Self::PROVIDER).without_action())
    }

    /// Always confirms with a fresh `cod_` reference
    #[instrument(skip(self, order, _report), fields(order_id = %order.id))]
    async fn complete(&self, order: &Order, _report: PaymentReport) -> CartResult<PaymentOutcome> {
        let payment_id = format!("cod_{}", Uuid::new_v4().simple());
        info!(
            "Cash on delivery accepted: {} to collect",
            order.amount_due().display()
        );
        Ok(PaymentOutcome::Succeeded { payment_id })
    }

    fn provider_name(&self) -> &'static str {
        Self::PROVIDER
    }
}
