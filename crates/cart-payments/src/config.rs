//! # Gateway Configuration
//!
//! Configuration for the hosted checkout widget.
//! Values are loaded from environment variables.

use cart_core::CartError;
use std::env;

/// Mock gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Public key the client widget opens with (test_... or live_...)
    pub key_id: String,

    /// Merchant name shown in the widget
    pub merchant_name: String,

    /// Largest single payment the gateway accepts, in minor units
    pub max_amount: i64,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// - `GATEWAY_KEY_ID` (default `test_furnistore`)
    /// - `GATEWAY_MERCHANT_NAME` (default `FurniStore`)
    /// - `GATEWAY_MAX_AMOUNT` in minor units (default 50,00,000 rupees)
    pub fn from_env() -> Result<Self, CartError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let key_id = env::var("GATEWAY_KEY_ID").unwrap_or_else(|_| "test_furnistore".to_string());
        if !key_id.starts_with("test_") && !key_id.starts_with("live_") {
            return Err(CartError::Configuration(
                "GATEWAY_KEY_ID must start with test_ or live_".to_string(),
            ));
        }

        let merchant_name =
            env::var("GATEWAY_MERCHANT_NAME").unwrap_or_else(|_| "FurniStore".to_string());

        let max_amount = match env::var("GATEWAY_MAX_AMOUNT") {
            Ok(raw) => raw.trim().parse::<i64>().map_err(|_| {
                CartError::Configuration(format!("GATEWAY_MAX_AMOUNT is not a number: {}", raw))
            })?,
            Err(_) => Self::DEFAULT_MAX_AMOUNT,
        };

        Ok(Self {
            key_id,
            merchant_name,
            max_amount,
        })
    }

    const DEFAULT_MAX_AMOUNT: i64 = 500_000_000;

    /// Create config with an explicit key (for testing)
    pub fn new(key_id: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            merchant_name: "FurniStore".to_string(),
            max_amount: Self::DEFAULT_MAX_AMOUNT,
        }
    }

    /// Check if using a test key
    pub fn is_test_mode(&self) -> bool {
        self.key_id.starts_with("test_")
    }

    /// Builder: cap single payments
    pub fn with_max_amount(mut self, max_amount: i64) -> Self {
        self.max_amount = max_amount;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_mode() {
        assert!(GatewayConfig::new("test_abc").is_test_mode());
        assert!(!GatewayConfig::new("live_abc").is_test_mode());
    }

    #[test]
    fn test_from_env() {
        env::remove_var("GATEWAY_MAX_AMOUNT");
        env::set_var("GATEWAY_KEY_ID", "test_env");
        let config = GatewayConfig::from_env().unwrap();
        assert_eq!(config.key_id, "test_env");
        assert_eq!(config.max_amount, 500_000_000);

        env::set_var("GATEWAY_KEY_ID", "sk_wrong");
        assert!(GatewayConfig::from_env().is_err());
        env::remove_var("GATEWAY_KEY_ID");
    }
}
