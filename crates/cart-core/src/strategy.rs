//! # Payment Strategy Trait
//!
//! The checkout/payment initiator seam. A strategy takes a pending
//! [`Order`], starts the provider's payment exchange, and later turns the
//! provider's success/failure report into a [`PaymentOutcome`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PaymentStrategy (trait)                  │
//! │  ├── initiate()                                             │
//! │  ├── complete()                                             │
//! │  └── provider_name()                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                  ┌─────────┴─────────┐
//!                  │                   │
//!          ┌───────┴───────┐   ┌───────┴───────┐
//!          │  MockGateway  │   │ CashOnDelivery│
//!          │   Strategy    │   │   Strategy    │
//!          └───────────────┘   └───────────────┘
//! ```
//!
//! The engine never talks to a provider itself: the caller clears the cart
//! once an outcome is [`PaymentOutcome::Succeeded`].

use crate::error::CartResult;
use crate::money::Price;
use crate::order::Order;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// What the client needs to run the provider's payment step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Provider's session/reference ID
    pub session_id: String,

    /// Our order ID
    pub order_id: String,

    /// Provider name (e.g., "mock_gateway", "cod")
    pub provider: String,

    /// Amount to collect
    pub amount: Price,

    /// Public key the client widget is opened with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,

    /// Whether the shopper must complete a step with the provider
    pub requires_action: bool,

    pub created_at: DateTime<Utc>,
}

impl PaymentSession {
    pub fn new(
        session_id: impl Into<String>,
        order: &Order,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            order_id: order.id.clone(),
            provider: provider.into(),
            amount: order.amount_due(),
            key_id: None,
            requires_action: true,
            created_at: Utc::now(),
        }
    }

    /// Builder: set the widget key
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Builder: no shopper action needed
    pub fn without_action(mut self) -> Self {
        self.requires_action = false;
        self
    }
}

/// The result the client reports back from the provider's widget
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentReport {
    pub success: bool,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl PaymentReport {
    pub fn succeeded(payment_id: impl Into<String>) -> Self {
        Self {
            success: true,
            payment_id: Some(payment_id.into()),
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            payment_id: None,
            reason: Some(reason.into()),
        }
    }
}

/// Final word from a strategy on a payment attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Succeeded { payment_id: String },
    Failed { reason: String },
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Succeeded { .. })
    }
}

/// Core trait for payment provider implementations.
///
/// Each provider implements this trait so checkout can pick one by
/// the order's payment method.
#[async_trait]
pub trait PaymentStrategy: Send + Sync {
    /// Start a payment for `order`.
    ///
    /// # Returns
    /// A `PaymentSession` the client uses to run the provider's step.
    async fn initiate(&self, order: &Order) -> CartResult<PaymentSession>;

    /// Turn the client's report into an outcome.
    ///
    /// Malformed reports are errors; a declined payment is `Ok(Failed)`.
    async fn complete(&self, order: &Order, report: PaymentReport) -> CartResult<PaymentOutcome>;

    /// Get the provider name (for logging and routing).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a boxed payment strategy (dynamic dispatch)
pub type BoxedPaymentStrategy = Arc<dyn PaymentStrategy>;

/// Strategy selector for multiple providers
#[derive(Clone, Default)]
pub struct PaymentStrategySelector {
    strategies: HashMap<String, BoxedPaymentStrategy>,
}

impl PaymentStrategySelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payment strategy
    pub fn register(&mut self, strategy: BoxedPaymentStrategy) {
        let name = strategy.provider_name().to_string();
        self.strategies.insert(name, strategy);
    }

    /// Register with builder pattern
    pub fn with_strategy(mut self, strategy: BoxedPaymentStrategy) -> Self {
        self.register(strategy);
        self
    }

    /// Get a strategy by provider name
    pub fn get(&self, provider: &str) -> Option<&BoxedPaymentStrategy> {
        self.strategies.get(provider)
    }

    /// List all registered providers, sorted
    pub fn providers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Check if a provider is registered
    pub fn has_provider(&self, provider: &str) -> bool {
        self.strategies.contains_key(provider)
    }
}
