//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the catalog, pricing and promo configuration, payment strategies,
//! and one [`CartSession`] per browsing session.

use crate::store::{BackgroundStore, SharedCartStore};
use cart_core::{
    restore_cart, validate_session_id, BoxedPaymentStrategy, Cart, CartError, CartResult,
    CartSession, CartStore, JsonFileCartStore, MemoryCartStore, Order, PaymentStrategySelector,
    PricingConfig, ProductCatalog, PromoTable,
};
use cart_payments::{CashOnDeliveryStrategy, MockGatewayStrategy};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A session's cart as the API holds it
pub type SessionCart = CartSession<BackgroundStore>;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Directory for persisted carts; in-memory when unset
    pub data_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            data_dir: std::env::var("CART_DATA_DIR").ok().map(PathBuf::from),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Delivery pricing
    pub pricing: PricingConfig,
    /// Product catalog
    pub catalog: Arc<ProductCatalog>,
    /// Promo codes
    pub promotions: Arc<PromoTable>,
    /// Payment strategy selector
    pub strategies: PaymentStrategySelector,
    /// Cart persistence
    pub store: BackgroundStore,
    carts: Arc<Mutex<HashMap<String, SessionCart>>>,
    orders: Arc<Mutex<HashMap<String, Order>>>,
}

impl AppState {
    /// Build state from the environment and config files
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let pricing = PricingConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load pricing config: {}", e))?;

        let catalog = load_product_catalog()?;
        let promotions = load_promotions()?;

        let gateway = MockGatewayStrategy::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize payment gateway: {}", e))?;
        let strategies = PaymentStrategySelector::new()
            .with_strategy(Arc::new(gateway) as BoxedPaymentStrategy)
            .with_strategy(Arc::new(CashOnDeliveryStrategy::new()) as BoxedPaymentStrategy);

        let inner: SharedCartStore = match &config.data_dir {
            Some(dir) => {
                tracing::info!("Persisting carts under {}", dir.display());
                Arc::new(
                    JsonFileCartStore::new(dir)
                        .map_err(|e| anyhow::anyhow!("Failed to open cart store: {}", e))?,
                )
            }
            None => {
                tracing::warn!("CART_DATA_DIR not set, carts are kept in memory only");
                Arc::new(MemoryCartStore::new())
            }
        };

        Ok(Self::with_parts(
            config,
            pricing,
            catalog,
            promotions,
            strategies,
            BackgroundStore::spawn(inner),
        ))
    }

    /// Assemble state from explicit parts
    pub fn with_parts(
        config: AppConfig,
        pricing: PricingConfig,
        catalog: ProductCatalog,
        promotions: PromoTable,
        strategies: PaymentStrategySelector,
        store: BackgroundStore,
    ) -> Self {
        Self {
            config,
            pricing,
            catalog: Arc::new(catalog),
            promotions: Arc::new(promotions),
            strategies,
            store,
            carts: Arc::new(Mutex::new(HashMap::new())),
            orders: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `f` against a session's cart, restoring it from the store on first use.
    ///
    /// The load runs before the cart map lock is taken; `f` itself runs under
    /// the lock, so each mutation is one atomic read-modify-write. Only
    /// non-empty carts stay in memory.
    pub async fn with_cart<R>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut SessionCart) -> R,
    ) -> CartResult<R> {
        validate_session_id(session_id)?;

        let loaded = if self.is_open(session_id)? {
            None
        } else {
            Some(self.store.fetch(session_id).await)
        };

        let mut carts = self.lock_carts()?;
        let session = carts.entry(session_id.to_string()).or_insert_with(|| {
            // A cart evicted meanwhile was empty, so an empty load is accurate
            CartSession::restore(
                session_id,
                self.pricing.currency(),
                loaded.unwrap_or(Ok(None)),
                self.store.clone(),
            )
        });
        let result = f(session);
        if session.cart().is_empty() {
            carts.remove(session_id);
        }
        Ok(result)
    }

    /// Copy of a session's cart. Never opens a session.
    pub async fn cart_snapshot(&self, session_id: &str) -> CartResult<Cart> {
        validate_session_id(session_id)?;

        let open = self.lock_carts()?.get(session_id).map(|s| s.cart().clone());
        if let Some(cart) = open {
            return Ok(cart);
        }
        let loaded = self.store.fetch(session_id).await;
        Ok(restore_cart(session_id, self.pricing.currency(), loaded))
    }

    /// Drop a session's cart from memory and storage
    pub fn discard_cart(&self, session_id: &str) -> CartResult<()> {
        validate_session_id(session_id)?;
        self.lock_carts()?.remove(session_id);
        self.store.discard(session_id)
    }

    /// Number of carts held in memory
    pub fn open_sessions(&self) -> usize {
        self.carts.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn is_open(&self, session_id: &str) -> CartResult<bool> {
        Ok(self.lock_carts()?.contains_key(session_id))
    }

    fn lock_carts(&self) -> CartResult<std::sync::MutexGuard<'_, HashMap<String, SessionCart>>> {
        self.carts
            .lock()
            .map_err(|_| CartError::Internal("cart map lock poisoned".to_string()))
    }

    /// Store or replace an order
    pub fn put_order(&self, order: Order) -> CartResult<()> {
        let mut orders = self
            .orders
            .lock()
            .map_err(|_| CartError::Internal("order map lock poisoned".to_string()))?;
        orders.insert(order.id.clone(), order);
        Ok(())
    }

    /// Snapshot of an order
    pub fn order(&self, order_id: &str) -> CartResult<Order> {
        let orders = self
            .orders
            .lock()
            .map_err(|_| CartError::Internal("order map lock poisoned".to_string()))?;
        orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| CartError::OrderNotFound {
                order_id: order_id.to_string(),
            })
    }

    /// Apply `f` to a stored order under the lock
    pub fn update_order<R>(
        &self,
        order_id: &str,
        f: impl FnOnce(&mut Order) -> CartResult<R>,
    ) -> CartResult<R> {
        let mut orders = self
            .orders
            .lock()
            .map_err(|_| CartError::Internal("order map lock poisoned".to_string()))?;
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| CartError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;
        f(order)
    }
}

/// Load product catalog from config file
fn load_product_catalog() -> anyhow::Result<ProductCatalog> {
    let config_paths = [
        "config/products.toml",
        "../config/products.toml",
        "../../config/products.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = ProductCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} products from {}", catalog.products.len(), path);
            return Ok(catalog);
        }
    }

    tracing::warn!("No product catalog found, using empty catalog");
    Ok(ProductCatalog::new())
}

/// Load promo codes from config file, falling back to the storefront defaults
fn load_promotions() -> anyhow::Result<PromoTable> {
    let config_paths = [
        "config/promotions.toml",
        "../config/promotions.toml",
        "../../config/promotions.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let table = PromoTable::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} promo codes from {}", table.len(), path);
            return Ok(table);
        }
    }

    tracing::warn!("No promotions config found, using storefront defaults");
    Ok(PromoTable::storefront_defaults())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use cart_core::{Currency, Price, Product};
    use cart_payments::GatewayConfig;

    pub fn catalog() -> ProductCatalog {
        let mut catalog = ProductCatalog::new();
        let mut sofa = Product::new("sofa-1", "Sofa", Price::new(45999.0, Currency::INR))
            .with_image("img.jpg")
            .with_category("Living Room");
        sofa.featured = true;
        catalog.add(sofa);
        catalog.add(
            Product::new("chair-7", "Wingback Armchair", Price::new(12999.0, Currency::INR))
                .with_colors(["Teal", "Mustard"]),
        );
        catalog.add(
            Product::new("lamp-3", "Floor Lamp", Price::new(1499.0, Currency::INR))
                .with_category("Lighting"),
        );
        catalog.add(
            Product::new("bed-2", "Queen Bed", Price::new(34999.0, Currency::INR)).out_of_stock(),
        );
        catalog
    }

    /// State backed by an in-memory store. Needs a Tokio runtime.
    pub fn state() -> (AppState, Arc<MemoryCartStore>) {
        let memory = Arc::new(MemoryCartStore::new());
        let strategies = PaymentStrategySelector::new()
            .with_strategy(Arc::new(MockGatewayStrategy::new(GatewayConfig::new("test_key")))
                as BoxedPaymentStrategy)
            .with_strategy(Arc::new(CashOnDeliveryStrategy::new()) as BoxedPaymentStrategy);

        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            data_dir: None,
        };

        let state = AppState::with_parts(
            config,
            PricingConfig::default(),
            catalog(),
            PromoTable::storefront_defaults(),
            strategies,
            BackgroundStore::spawn(memory.clone()),
        );
        (state, memory)
    }
}
