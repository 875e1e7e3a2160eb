//! # Cart Error Types
//!
//! Typed error handling for the FurniStore cart engine.
//! Every fallible cart, pricing and checkout operation returns `Result<T, CartError>`.

use thiserror::Error;

/// Core error type for cart and checkout operations
#[derive(Debug, Error)]
pub enum CartError {
    /// Configuration errors (bad env values, unreadable config files)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Product not found in catalog
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Product exists but cannot currently be bought
    #[error("Product is out of stock: {product_id}")]
    OutOfStock { product_id: String },

    /// Negative or otherwise unusable price
    #[error("Invalid price: {message}")]
    InvalidPrice { message: String },

    /// Quantity outside the accepted range
    #[error("Invalid quantity: {message}")]
    InvalidQuantity { message: String },

    /// Colour/size the product does not offer
    #[error("Invalid variant for {product_id}: {message}")]
    InvalidVariant { product_id: String, message: String },

    /// Line or rule priced in a different currency than the cart
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: String, found: String },

    /// Checkout attempted with nothing in the cart
    #[error("Cart is empty")]
    EmptyCart,

    /// Shipping address failed validation
    #[error("Invalid shipping address: {0}")]
    InvalidAddress(String),

    /// Order not found
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    /// Order is not in a state that allows the requested transition
    #[error("Order {order_id} cannot be updated: {message}")]
    InvalidOrderState { order_id: String, message: String },

    /// Payment provider not registered
    #[error("Unknown payment provider: {0}")]
    UnknownProvider(String),

    /// Payment was declined or reported as failed
    #[error("Payment declined: {reason}")]
    PaymentDeclined { reason: String },

    /// Reading or writing persisted cart state failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CartError {
    /// Returns true if the caller sent something the engine refuses
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CartError::Configuration(_) => 500,
            CartError::InvalidRequest(_) => 400,
            CartError::ProductNotFound { .. } => 404,
            CartError::OutOfStock { .. } => 400,
            CartError::InvalidPrice { .. } => 400,
            CartError::InvalidQuantity { .. } => 400,
            CartError::InvalidVariant { .. } => 400,
            CartError::CurrencyMismatch { .. } => 400,
            CartError::EmptyCart => 400,
            CartError::InvalidAddress(_) => 422,
            CartError::OrderNotFound { .. } => 404,
            CartError::InvalidOrderState { .. } => 409,
            CartError::UnknownProvider(_) => 400,
            CartError::PaymentDeclined { .. } => 402,
            CartError::Persistence(_) => 500,
            CartError::Serialization(_) => 500,
            CartError::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for CartError {
    fn from(err: serde_json::Error) -> Self {
        CartError::Serialization(err.to_string())
    }
}

/// Result type alias for cart operations
pub type CartResult<T> = Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(CartError::EmptyCart.is_client_error());
        assert!(CartError::InvalidQuantity {
            message: "quantity must be at least 1".into()
        }
        .is_client_error());
        assert!(!CartError::Persistence("disk full".into()).is_client_error());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CartError::InvalidRequest("test".into()).status_code(),
            400
        );
        assert_eq!(
            CartError::ProductNotFound {
                product_id: "x".into()
            }
            .status_code(),
            404
        );
        assert_eq!(
            CartError::PaymentDeclined {
                reason: "card declined".into()
            }
            .status_code(),
            402
        );
        assert_eq!(CartError::InvalidAddress("pincode".into()).status_code(), 422);
    }

    #[test]
    fn test_serde_json_conversion() {
        let err: CartError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, CartError::Serialization(_)));
    }
}
