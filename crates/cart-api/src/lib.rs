//! # cart-api
//!
//! HTTP API layer for furnistore-cart.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - One cart per browsing session, persisted in the background
//! - Checkout into orders with a pluggable payment hand-off
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/products` | List products |
//! | GET | `/api/v1/products/{id}` | Get product |
//! | GET | `/api/v1/carts/{session_id}` | Cart contents |
//! | POST | `/api/v1/carts/{session_id}/items` | Add item |
//! | PUT | `/api/v1/carts/{session_id}/items/{product_id}` | Set quantity |
//! | DELETE | `/api/v1/carts/{session_id}/items/{product_id}` | Remove item |
//! | DELETE | `/api/v1/carts/{session_id}` | Clear cart |
//! | GET | `/api/v1/carts/{session_id}/totals` | Totals with optional promo |
//! | POST | `/api/v1/carts/{session_id}/checkout` | Place order |
//! | GET | `/api/v1/orders/{order_id}` | Get order |
//! | POST | `/api/v1/orders/{order_id}/payment` | Report payment result |

pub mod handlers;
pub mod routes;
pub mod state;
pub mod store;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
pub use store::BackgroundStore;
