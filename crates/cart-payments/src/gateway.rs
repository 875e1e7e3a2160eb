//! # Mock Gateway Checkout
//!
//! The storefront's hosted checkout widget. `initiate` hands the client the
//! amount and public key to open the widget with; the widget then reports
//! success (with a payment id) or failure, which `complete` turns into an
//! outcome. No server-to-server verification takes place.

use crate::config::GatewayConfig;
use async_trait::async_trait;
use cart_core::{
    CartError, CartResult, Order, PaymentOutcome, PaymentReport, PaymentSession, PaymentStrategy,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Hosted widget payment strategy
pub struct MockGatewayStrategy {
    config: GatewayConfig,
    /// order id -> gateway session id
    sessions: Mutex<HashMap<String, String>>,
}

impl MockGatewayStrategy {
    pub const PROVIDER: &'static str = "mock_gateway";

    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> CartResult<Self> {
        Ok(Self::new(GatewayConfig::from_env()?))
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn lock_sessions(&self) -> CartResult<MutexGuard<'_, HashMap<String, String>>> {
        self.sessions
            .lock()
            .map_err(|_| CartError::Internal("gateway session lock poisoned".to_string()))
    }

    fn session_for(&self, order_id: &str) -> CartResult<Option<String>> {
        Ok(self.lock_sessions()?.get(order_id).cloned())
    }

    /// Number of orders with a widget session still awaiting a successful report
    pub fn open_sessions(&self) -> usize {
        self.lock_sessions().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl PaymentStrategy for MockGatewayStrategy {
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn initiate(&self, order: &Order) -> CartResult<PaymentSession> {
        let amount = order.amount_due();
        if amount.amount <= 0 {
            return Err(CartError::InvalidRequest(
                "nothing to collect online for this order".to_string(),
            ));
        }
        if amount.amount > self.config.max_amount {
            return Err(CartError::InvalidRequest(format!(
                "{} exceeds the gateway limit",
                amount.display()
            )));
        }

        let session_id = format!("gw_{}", Uuid::new_v4().simple());
        self.lock_sessions()?
            .insert(order.id.clone(), session_id.clone());

        debug!(
            "Opening gateway widget: merchant={}, amount={}",
            self.config.merchant_name,
            amount.display()
        );
        info!("Created gateway session: {}", session_id);

        Ok(PaymentSession::new(session_id, order, Self::PROVIDER).with_key_id(&self.config.key_id))
    }

    #[instrument(skip(self, order, report), fields(order_id = %order.id, success = report.success))]
    async fn complete(&self, order: &Order, report: PaymentReport) -> CartResult<PaymentOutcome> {
        if self.session_for(&order.id)?.is_none() {
            return Err(CartError::InvalidOrderState {
                order_id: order.id.clone(),
                message: "no gateway session was opened for this order".to_string(),
            });
        }

        if !report.success {
            let reason = report
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "payment failed".to_string());
            warn!("Gateway reported failure: {}", reason);
            return Ok(PaymentOutcome::Failed { reason });
        }

        let payment_id = report
            .payment_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                CartError::InvalidRequest("successful payment report needs a payment_id".to_string())
            })?;

        // a failed report keeps the session so the shopper can retry
        self.lock_sessions()?.remove(&order.id);
        info!("Gateway payment succeeded: {}", payment_id);
        Ok(PaymentOutcome::Succeeded { payment_id })
    }

    fn provider_name(&self) -> &'static str {
        Self::PROVIDER
    }
}
