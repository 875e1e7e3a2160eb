//! # Cart Session
//!
//! A [`Cart`] bound to one browsing session and its [`CartStore`].
//! The cart is loaded once when the session opens and saved after every
//! mutation. Store failures are logged and swallowed: they never undo or
//! fail a mutation.

use crate::cart::{Cart, CartLine, Variant};
use crate::error::CartResult;
use crate::money::Currency;
use crate::persistence::CartStore;
use crate::pricing::{PricingConfig, PricingResult};
use crate::promo::PromotionLookup;
use tracing::{debug, warn};

/// One session's cart plus the store it persists to
#[derive(Debug)]
pub struct CartSession<S> {
    session_id: String,
    cart: Cart,
    store: S,
}

impl<S: CartStore> CartSession<S> {
    /// Open a session, restoring whatever the store has for it.
    ///
    /// A load failure starts the session with an empty cart.
    pub fn open(session_id: impl Into<String>, currency: Currency, store: S) -> Self {
        let session_id = session_id.into();
        let loaded = store.load(&session_id);
        Self::restore(session_id, currency, loaded, store)
    }

    /// Build a session from a load that already ran against `store`
    pub fn restore(
        session_id: impl Into<String>,
        currency: Currency,
        loaded: CartResult<Option<Vec<CartLine>>>,
        store: S,
    ) -> Self {
        let session_id = session_id.into();
        let cart = restore_cart(&session_id, currency, loaded);
        Self {
            session_id,
            cart,
            store,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Read-only view of the cart
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// See [`Cart::add_item`]. Validation errors are returned; nothing is saved for them.
    pub fn add_item(&mut self, line: CartLine) -> CartResult<()> {
        self.cart.add_item(line)?;
        self.persist();
        Ok(())
    }

    /// See [`Cart::remove_item`]
    pub fn remove_item(&mut self, product_id: &str, variant: &Variant) -> bool {
        let removed = self.cart.remove_item(product_id, variant);
        if removed {
            self.persist();
        }
        removed
    }

    /// See [`Cart::set_quantity`]
    pub fn set_quantity(&mut self, product_id: &str, variant: &Variant, quantity: i64) -> bool {
        let changed = self.cart.set_quantity(product_id, variant, quantity);
        if changed {
            self.persist();
        }
        changed
    }

    /// Empty the cart (after checkout, on logout)
    pub fn clear(&mut self) {
        self.cart.clear();
        self.persist();
    }

    pub fn total_items(&self) -> u64 {
        self.cart.total_items()
    }

    pub fn compute_totals(
        &self,
        promo_code: Option<&str>,
        config: &PricingConfig,
        promotions: &dyn PromotionLookup,
    ) -> PricingResult {
        self.cart.compute_totals(promo_code, config, promotions)
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.session_id, self.cart.lines()) {
            warn!("Failed to save cart for session {}: {}", self.session_id, e);
        }
    }
}

/// Turn a store load into a cart; failures give an empty cart
pub fn restore_cart(
    session_id: &str,
    currency: Currency,
    loaded: CartResult<Option<Vec<CartLine>>>,
) -> Cart {
    match loaded {
        Ok(Some(lines)) => {
            debug!("Restored {} cart lines for session {}", lines.len(), session_id);
            Cart::restore(currency, lines)
        }
        Ok(None) => Cart::new(currency),
        Err(e) => {
            warn!("Failed to load cart for session {}: {}", session_id, e);
            Cart::new(currency)
        }
    }
}
