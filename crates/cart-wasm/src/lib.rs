//! # cart-wasm
//!
//! WebAssembly bindings for furnistore-cart.
//!
//! Runs the cart engine inside the storefront so the cart survives page
//! reloads without a round trip. Lines are kept in `window.localStorage`.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCart } from 'furnistore-cart-wasm';
//!
//! await init();
//!
//! const cart = new WasmCart('guest');
//! cart.add_item(product, 1, 'Teal', undefined);
//! console.log(cart.compute_totals('SAVE10'));
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

use cart_core::{
    CartError, CartLine, CartResult, CartSession, CartStore, Currency, PricingConfig, Price,
    Product, PromoTable, Variant,
};
use wasm_bindgen::prelude::*;

/// localStorage key prefix for saved carts
pub const STORAGE_PREFIX: &str = "furnistore-cart:";

/// Cart store backed by `window.localStorage`.
///
/// Outside a browser, or when storage is disabled, nothing is saved and
/// every session starts empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageCartStore;

impl LocalStorageCartStore {
    fn key(session_id: &str) -> String {
        format!("{}{}", STORAGE_PREFIX, session_id)
    }

    #[cfg(target_arch = "wasm32")]
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn storage() -> Option<web_sys::Storage> {
        None
    }
}

fn js_error(context: &str, err: JsValue) -> CartError {
    CartError::Persistence(format!("{}: {:?}", context, err))
}

impl CartStore for LocalStorageCartStore {
    fn load(&self, session_id: &str) -> CartResult<Option<Vec<CartLine>>> {
        let Some(storage) = Self::storage() else {
            return Ok(None);
        };
        match storage
            .get_item(&Self::key(session_id))
            .map_err(|e| js_error("localStorage read failed", e))?
        {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, session_id: &str, lines: &[CartLine]) -> CartResult<()> {
        let Some(storage) = Self::storage() else {
            return Ok(());
        };
        let raw = serde_json::to_string(lines)?;
        storage
            .set_item(&Self::key(session_id), &raw)
            .map_err(|e| js_error("localStorage write failed", e))
    }

    fn discard(&self, session_id: &str) -> CartResult<()> {
        let Some(storage) = Self::storage() else {
            return Ok(());
        };
        storage
            .remove_item(&Self::key(session_id))
            .map_err(|e| js_error("localStorage delete failed", e))
    }
}

fn to_js_error(err: CartError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// A shopper's cart living in the browser
#[wasm_bindgen]
pub struct WasmCart {
    session: CartSession<LocalStorageCartStore>,
    pricing: PricingConfig,
    promotions: PromoTable,
}

#[wasm_bindgen]
impl WasmCart {
    /// Open the cart for `session_id`, restoring saved lines
    #[wasm_bindgen(constructor)]
    pub fn new(session_id: String) -> Self {
        Self::with_store(session_id, LocalStorageCartStore)
    }

    /// Add a catalog product (as returned by `/api/v1/products`)
    pub fn add_item(
        &mut self,
        product: JsValue,
        quantity: u32,
        color: Option<String>,
        size: Option<String>,
    ) -> Result<(), JsValue> {
        let product: Product = serde_wasm_bindgen::from_value(product)
            .map_err(|e| JsValue::from_str(&format!("Invalid product: {}", e)))?;
        self.add_product(&product, quantity, color.as_deref(), size.as_deref())
            .map_err(to_js_error)
    }

    /// Remove a line; returns whether anything was removed
    pub fn remove_item(&mut self, product_id: &str, color: Option<String>, size: Option<String>) -> bool {
        let variant = Variant::from_options(color.as_deref(), size.as_deref());
        self.session.remove_item(product_id, &variant)
    }

    /// Overwrite a line's quantity; zero or below removes it
    pub fn set_quantity(
        &mut self,
        product_id: &str,
        color: Option<String>,
        size: Option<String>,
        quantity: i32,
    ) -> bool {
        let variant = Variant::from_options(color.as_deref(), size.as_deref());
        self.session
            .set_quantity(product_id, &variant, i64::from(quantity))
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    /// Number of units across all lines
    pub fn total_items(&self) -> u32 {
        u32::try_from(self.session.total_items()).unwrap_or(u32::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.session.cart().is_empty()
    }

    /// Subtotal in paise
    pub fn subtotal(&self) -> i64 {
        self.session.cart().subtotal().amount
    }

    /// Subtotal ready for display, e.g. "₹2999.00"
    pub fn subtotal_display(&self) -> String {
        self.session.cart().subtotal().display()
    }

    /// Current lines as plain objects
    pub fn lines(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.session.lines())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Totals with an optional promo code
    pub fn compute_totals(&self, promo_code: Option<String>) -> Result<JsValue, JsValue> {
        let totals =
            self.session
                .compute_totals(promo_code.as_deref(), &self.pricing, &self.promotions);
        serde_wasm_bindgen::to_value(&totals).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl WasmCart {
    fn with_store(session_id: String, store: LocalStorageCartStore) -> Self {
        let pricing = PricingConfig::default();
        Self {
            session: CartSession::open(session_id, pricing.currency(), store),
            pricing,
            promotions: PromoTable::storefront_defaults(),
        }
    }

    fn add_product(
        &mut self,
        product: &Product,
        quantity: u32,
        color: Option<&str>,
        size: Option<&str>,
    ) -> CartResult<()> {
        if !product.in_stock {
            return Err(CartError::OutOfStock {
                product_id: product.id.clone(),
            });
        }
        let variant = product.resolve_variant(color, size)?;
        self.session
            .add_item(CartLine::from_product(product, quantity, variant))
    }
}

fn format_minor(amount: i64, currency: &str) -> CartResult<String> {
    let currency = Currency::parse(currency)?;
    Ok(Price::from_minor(amount, currency).display())
}

/// Format an amount in the smallest unit, e.g. (299900, "inr") -> "₹2999.00"
#[wasm_bindgen]
pub fn format_price(amount: i64, currency: &str) -> Result<String, JsValue> {
    format_minor(amount, currency).map_err(to_js_error)
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
