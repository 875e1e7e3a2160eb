//! # Request Handlers
//!
//! Axum request handlers for the cart API.
//! Cart state is per browsing session; the session id is part of the path.

use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use cart_core::{
    Cart, CartError, CartLine, CartResult, Order, PaymentMethod, PaymentOutcome, PaymentReport,
    PaymentSession, Price, PricingResult, ShippingAddress, Variant,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Add-to-cart request
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    /// Catalog product ID
    pub product_id: String,
    /// Quantity to add
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

/// Set-quantity request; zero or below removes the line
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

/// Variant selection in a query string
#[derive(Debug, Default, Deserialize)]
pub struct VariantQuery {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

/// Product listing filters
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub category: Option<String>,
    /// Only landing-page products
    #[serde(default)]
    pub featured: Option<bool>,
}

/// Totals query
#[derive(Debug, Default, Deserialize)]
pub struct TotalsQuery {
    #[serde(default)]
    pub promo_code: Option<String>,
}

/// Checkout request
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub promo_code: Option<String>,
}

/// Cart contents
#[derive(Debug, Serialize)]
pub struct CartView {
    pub session_id: String,
    pub lines: Vec<CartLine>,
    pub total_items: u64,
    pub subtotal: Price,
    pub is_empty: bool,
}

/// Checkout response
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: Order,
    /// Hand this to the client to run the payment step
    pub payment: PaymentSession,
}

/// Payment result response
#[derive(Debug, Serialize)]
pub struct PaymentResultResponse {
    pub order: Order,
    pub outcome: PaymentOutcome,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn cart_error_to_response(err: CartError) -> ApiError {
    let code = err.status_code();
    if !err.is_client_error() {
        error!("Request failed: {}", err);
    }
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn cart_view(session_id: &str, cart: &Cart) -> CartView {
    CartView {
        session_id: session_id.to_string(),
        lines: cart.lines().to_vec(),
        total_items: cart.total_items(),
        subtotal: cart.subtotal(),
        is_empty: cart.is_empty(),
    }
}

/// The variant a line for `product_id` was stored under.
///
/// Catalog products resolve the same way as on add, so `teal` finds the
/// `Teal` line; ids no longer in the catalog match the options verbatim.
fn line_variant(
    state: &AppState,
    product_id: &str,
    color: Option<&str>,
    size: Option<&str>,
) -> Variant {
    state
        .catalog
        .get(product_id)
        .and_then(|product| product.resolve_variant(color, size).ok())
        .unwrap_or_else(|| Variant::from_options(color, size))
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "furnistore-cart",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Get products list
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> impl IntoResponse {
    let products: Vec<_> = match query.category.as_deref() {
        Some(category) => state
            .catalog
            .by_category(category)
            .filter(|p| p.in_stock)
            .collect(),
        None => state.catalog.in_stock_products().collect(),
    };
    let products: Vec<_> = products
        .into_iter()
        .filter(|p| query.featured.map_or(true, |featured| p.featured == featured))
        .collect();
    Json(serde_json::json!({
        "products": products,
        "count": products.len()
    }))
}

/// Get single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.catalog.get(&product_id).ok_or_else(|| {
        cart_error_to_response(CartError::ProductNotFound {
            product_id: product_id.clone(),
        })
    })?;

    Ok(Json(product.clone()))
}

/// Get a session's cart
pub async fn get_cart(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    let cart = state
        .cart_snapshot(&session_id)
        .await
        .map_err(cart_error_to_response)?;
    Ok(Json(cart_view(&session_id, &cart)))
}

/// Add a catalog product to the cart
#[instrument(skip(state, request), fields(session_id = %session_id, product_id = %request.product_id))]
pub async fn add_item(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartView>), ApiError> {
    let product = state.catalog.get(&request.product_id).ok_or_else(|| {
        cart_error_to_response(CartError::ProductNotFound {
            product_id: request.product_id.clone(),
        })
    })?;

    if !product.in_stock {
        return Err(cart_error_to_response(CartError::OutOfStock {
            product_id: product.id.clone(),
        }));
    }

    let variant = product
        .resolve_variant(request.color.as_deref(), request.size.as_deref())
        .map_err(cart_error_to_response)?;
    let line = CartLine::from_product(product, request.quantity, variant);

    let view = state
        .with_cart(&session_id, |session| -> CartResult<CartView> {
            session.add_item(line)?;
            Ok(cart_view(&session_id, session.cart()))
        })
        .await
        .and_then(|result| result)
        .map_err(cart_error_to_response)?;

    info!("Added {} x {}", request.quantity, request.product_id);

    Ok((StatusCode::CREATED, Json(view)))
}

/// Overwrite a line's quantity
#[instrument(skip(state, request), fields(session_id = %session_id, product_id = %product_id))]
pub async fn set_quantity(
    State(state): State<AppState>,
    Path((session_id, product_id)): Path<(String, String)>,
    Json(request): Json<SetQuantityRequest>,
) -> Result<Json<CartView>, ApiError> {
    let variant = line_variant(
        &state,
        &product_id,
        request.color.as_deref(),
        request.size.as_deref(),
    );
    let (changed, view) = state
        .with_cart(&session_id, |session| {
            let changed = session.set_quantity(&product_id, &variant, request.quantity);
            (changed, cart_view(&session_id, session.cart()))
        })
        .await
        .map_err(cart_error_to_response)?;

    if !changed {
        info!("No cart line to update");
    }

    Ok(Json(view))
}

/// Remove a line
#[instrument(skip(state, query), fields(session_id = %session_id, product_id = %product_id))]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((session_id, product_id)): Path<(String, String)>,
    Query(query): Query<VariantQuery>,
) -> Result<Json<CartView>, ApiError> {
    let variant = line_variant(
        &state,
        &product_id,
        query.color.as_deref(),
        query.size.as_deref(),
    );
    state
        .with_cart(&session_id, |session| {
            session.remove_item(&product_id, &variant);
            cart_view(&session_id, session.cart())
        })
        .await
        .map(Json)
        .map_err(cart_error_to_response)
}

/// Empty the cart
#[instrument(skip(state))]
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    state
        .with_cart(&session_id, |session| {
            session.clear();
            cart_view(&session_id, session.cart())
        })
        .await
        .map(Json)
        .map_err(cart_error_to_response)
}

/// Compute totals, optionally with a promo code
pub async fn get_totals(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<TotalsQuery>,
) -> Result<Json<PricingResult>, ApiError> {
    let cart = state
        .cart_snapshot(&session_id)
        .await
        .map_err(cart_error_to_response)?;
    Ok(Json(cart.compute_totals(
        query.promo_code.as_deref(),
        &state.pricing,
        state.promotions.as_ref(),
    )))
}

/// Freeze the cart into an order and start its payment
#[instrument(skip(state, request), fields(session_id = %session_id, method = ?request.payment_method))]
pub async fn checkout(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let strategy = state
        .strategies
        .get(request.payment_method.provider())
        .cloned()
        .ok_or_else(|| {
            cart_error_to_response(CartError::UnknownProvider(
                request.payment_method.provider().to_string(),
            ))
        })?;

    let cart = state
        .cart_snapshot(&session_id)
        .await
        .map_err(cart_error_to_response)?;
    let pricing = cart.compute_totals(
        request.promo_code.as_deref(),
        &state.pricing,
        state.promotions.as_ref(),
    );
    if !pricing.promo_valid {
        return Err(cart_error_to_response(CartError::InvalidRequest(format!(
            "promo code is not valid: {}",
            request.promo_code.as_deref().unwrap_or_default()
        ))));
    }
    let order = Order::from_cart(
        session_id.as_str(),
        &cart,
        pricing,
        request.shipping_address,
        request.payment_method,
    )
    .map_err(cart_error_to_response)?;

    let payment = strategy.initiate(&order).await.map_err(|e| {
        error!("Failed to initiate payment: {}", e);
        cart_error_to_response(e)
    })?;

    info!(
        "Checkout started: order={}, {} items, total={}, provider={}",
        order.id,
        order.item_count(),
        order.amount_due().display(),
        payment.provider
    );

    state.put_order(order.clone()).map_err(cart_error_to_response)?;

    Ok((StatusCode::CREATED, Json(CheckoutResponse { order, payment })))
}

/// Report the client-side payment result for an order
#[instrument(skip(state, report), fields(order_id = %order_id, success = report.success))]
pub async fn report_payment(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(report): Json<PaymentReport>,
) -> Result<Json<PaymentResultResponse>, ApiError> {
    let order = state.order(&order_id).map_err(cart_error_to_response)?;
    if !order.is_pending() {
        return Err(cart_error_to_response(CartError::InvalidOrderState {
            order_id,
            message: "order is already confirmed".to_string(),
        }));
    }

    let strategy = state
        .strategies
        .get(order.payment_method.provider())
        .cloned()
        .ok_or_else(|| {
            cart_error_to_response(CartError::UnknownProvider(
                order.payment_method.provider().to_string(),
            ))
        })?;

    let outcome = strategy
        .complete(&order, report)
        .await
        .map_err(cart_error_to_response)?;

    let updated = state
        .update_order(&order_id, |order| {
            match &outcome {
                PaymentOutcome::Succeeded { payment_id } => order.confirm(payment_id.as_str())?,
                PaymentOutcome::Failed { reason } => order.mark_failed(reason.as_str())?,
            }
            Ok(order.clone())
        })
        .map_err(cart_error_to_response)?;

    match &outcome {
        PaymentOutcome::Succeeded { payment_id } => {
            state
                .discard_cart(&updated.session_id)
                .map_err(cart_error_to_response)?;
            info!("Order {} confirmed with payment {}", updated.id, payment_id);
        }
        PaymentOutcome::Failed { reason } => {
            warn!("Payment for order {} failed: {}", updated.id, reason);
        }
    }

    Ok(Json(PaymentResultResponse {
        order: updated,
        outcome,
    }))
}

/// Get an order
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    state
        .order(&order_id)
        .map(Json)
        .map_err(cart_error_to_response)
}
