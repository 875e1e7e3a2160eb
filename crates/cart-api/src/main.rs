//! # FurniStore Cart
//!
//! Cart, pricing and checkout service for the FurniStore storefront.
//!
//! ## Usage
//!
//! ```bash
//! # Optional settings
//! export PORT=8080
//! export CART_DATA_DIR=./data/carts
//! export GATEWAY_KEY_ID=test_furnistore
//!
//! # Run the server
//! furnistore-cart
//! ```

use cart_api::{routes, state::AppState};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();
    let store = state.store.clone();

    info!("Environment: {}", state.config.environment);
    info!("Products loaded: {}", state.catalog.products.len());
    info!("Promo codes loaded: {}", state.promotions.len());
    info!(
        "Free delivery from {}, otherwise {}",
        state.pricing.free_delivery_threshold.display(),
        state.pricing.base_delivery_fee.display()
    );
    info!("Payment providers: {:?}", state.strategies.providers());

    let app = routes::create_router(state);

    info!("🛋️  FurniStore cart starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("🛒 Cart: GET http://{}/api/v1/carts/{{session_id}}", addr);
        info!("💳 Checkout: POST http://{}/api/v1/carts/{{session_id}}/checkout", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Flushing pending cart saves");
    store.flush().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn print_banner() {
    println!(
        r#"
  🛋️  FurniStore Cart
  ━━━━━━━━━━━━━━━━━━━━━━━
  Cart & pricing engine
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
