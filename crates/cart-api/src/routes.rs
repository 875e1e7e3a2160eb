//! # Routes
//!
//! Axum router configuration for the cart API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Catalog:
///   - GET  /api/v1/products - List in-stock products
///   - GET  /api/v1/products/{id} - Get product by ID
///
/// - Carts:
///   - GET    /api/v1/carts/{session_id} - Cart contents
///   - DELETE /api/v1/carts/{session_id} - Clear the cart
///   - POST   /api/v1/carts/{session_id}/items - Add an item
///   - PUT    /api/v1/carts/{session_id}/items/{product_id} - Set quantity
///   - DELETE /api/v1/carts/{session_id}/items/{product_id} - Remove a line
///   - GET    /api/v1/carts/{session_id}/totals - Totals (`?promo_code=`)
///   - POST   /api/v1/carts/{session_id}/checkout - Place an order
///
/// - Orders:
///   - GET  /api/v1/orders/{order_id} - Get order
///   - POST /api/v1/orders/{order_id}/payment - Report payment result
pub fn create_router(state: AppState) -> Router {
    // The storefront is served from a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let cart_routes = Router::new()
        .route(
            "/{session_id}",
            get(handlers::get_cart).delete(handlers::clear_cart),
        )
        .route("/{session_id}/items", post(handlers::add_item))
        .route(
            "/{session_id}/items/{product_id}",
            put(handlers::set_quantity).delete(handlers::remove_item),
        )
        .route("/{session_id}/totals", get(handlers::get_totals))
        .route("/{session_id}/checkout", post(handlers::checkout));

    let order_routes = Router::new()
        .route("/{order_id}", get(handlers::get_order))
        .route("/{order_id}/payment", post(handlers::report_payment));

    let api_routes = Router::new()
        .route("/products", get(handlers::list_products))
        .route("/products/{product_id}", get(handlers::get_product))
        .nest("/carts", cart_routes)
        .nest("/orders", order_routes);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::state;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use cart_core::CartStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn address() -> Value {
        json!({
            "full_name": "Asha Rao",
            "email": "asha@example.com",
            "phone": "9876543210",
            "address": "12 MG Road",
            "city": "Bengaluru",
            "state": "Karnataka",
            "pincode": "560001"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = state();
        let app = create_router(state);

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_products_hide_out_of_stock() {
        let (state, _) = state();
        let app = create_router(state);

        let (status, body) = send(&app, Method::GET, "/api/v1/products", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);

        let (_, body) = send(&app, Method::GET, "/api/v1/products?category=lighting", None).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["products"][0]["id"], "lamp-3");

        let (_, body) = send(&app, Method::GET, "/api/v1/products?featured=true", None).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["products"][0]["id"], "sofa-1");

        let (status, _) = send(&app, Method::GET, "/api/v1/products/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_add_merges_and_variants_stay_apart() {
        let (state, _) = state();
        let app = create_router(state);

        let uri = "/api/v1/carts/s1/items";
        let (status, _) = send(&app, Method::POST, uri, Some(json!({"product_id": "sofa-1"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, body) = send(
            &app,
            Method::POST,
            uri,
            Some(json!({"product_id": "sofa-1", "quantity": 2})),
        )
        .await;
        assert_eq!(body["lines"].as_array().unwrap().len(), 1);
        assert_eq!(body["lines"][0]["quantity"], 3);

        send(&app, Method::POST, uri, Some(json!({"product_id": "chair-7", "color": "Teal"}))).await;
        let (_, body) = send(
            &app,
            Method::POST,
            uri,
            Some(json!({"product_id": "chair-7", "color": "mustard"})),
        )
        .await;
        assert_eq!(body["lines"].as_array().unwrap().len(), 3);
        assert_eq!(body["total_items"], 5);
    }

    #[tokio::test]
    async fn test_add_rejections() {
        let (state, _) = state();
        let app = create_router(state);
        let uri = "/api/v1/carts/s1/items";

        let (status, body) = send(&app, Method::POST, uri, Some(json!({"product_id": "bed-2"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);

        let (status, _) = send(&app, Method::POST, uri, Some(json!({"product_id": "ghost"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            Method::POST,
            uri,
            Some(json!({"product_id": "chair-7", "color": "Purple"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            uri,
            Some(json!({"product_id": "sofa-1", "quantity": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_set_quantity_and_remove() {
        let (state, _) = state();
        let app = create_router(state);

        send(
            &app,
            Method::POST,
            "/api/v1/carts/s1/items",
            Some(json!({"product_id": "chair-7", "color": "Teal"})),
        )
        .await;
        send(
            &app,
            Method::POST,
            "/api/v1/carts/s1/items",
            Some(json!({"product_id": "lamp-3"})),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/v1/carts/s1/items/chair-7",
            Some(json!({"quantity": 4, "color": "Teal"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_items"], 5);

        // Wrong variant leaves the cart alone
        let (_, body) = send(
            &app,
            Method::DELETE,
            "/api/v1/carts/s1/items/chair-7?color=Mustard",
            None,
        )
        .await;
        assert_eq!(body["total_items"], 5);

        let (_, body) = send(
            &app,
            Method::DELETE,
            "/api/v1/carts/s1/items/chair-7?color=Teal",
            None,
        )
        .await;
        assert_eq!(body["total_items"], 1);

        let (_, body) = send(
            &app,
            Method::PUT,
            "/api/v1/carts/s1/items/lamp-3",
            Some(json!({"quantity": 0})),
        )
        .await;
        assert_eq!(body["is_empty"], true);
    }

    #[tokio::test]
    async fn test_variant_lookup_matches_add() {
        let (state, _) = state();
        let app = create_router(state);

        let (_, body) = send(
            &app,
            Method::POST,
            "/api/v1/carts/s1/items",
            Some(json!({"product_id": "chair-7", "color": "teal"})),
        )
        .await;
        assert_eq!(body["lines"][0]["variant"]["color"], "Teal");

        let (_, body) = send(
            &app,
            Method::PUT,
            "/api/v1/carts/s1/items/chair-7",
            Some(json!({"quantity": 3, "color": "teal"})),
        )
        .await;
        assert_eq!(body["total_items"], 3);

        let (_, body) = send(
            &app,
            Method::DELETE,
            "/api/v1/carts/s1/items/chair-7?color=teal",
            None,
        )
        .await;
        assert_eq!(body["is_empty"], true);

        send(
            &app,
            Method::POST,
            "/api/v1/carts/s1/items",
            Some(json!({"product_id": "chair-7", "color": "MUSTARD"})),
        )
        .await;
        let (_, body) = send(
            &app,
            Method::PUT,
            "/api/v1/carts/s1/items/chair-7",
            Some(json!({"quantity": 0, "color": "mustard"})),
        )
        .await;
        assert_eq!(body["is_empty"], true);
    }

    #[tokio::test]
    async fn test_reads_do_not_hold_sessions() {
        let (state, _) = state();
        let app = create_router(state.clone());

        for i in 0..500 {
            let (status, body) =
                send(&app, Method::GET, &format!("/api/v1/carts/visitor-{}", i), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["is_empty"], true);
        }
        send(&app, Method::GET, "/api/v1/carts/visitor-1/totals", None).await;
        send(&app, Method::DELETE, "/api/v1/carts/visitor-2/items/lamp-3", None).await;
        assert_eq!(state.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_invalid_session_id() {
        let (state, _) = state();
        let app = create_router(state);

        let (status, body) = send(&app, Method::GET, "/api/v1/carts/alice.smith", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/carts/alice.smith/items",
            Some(json!({"product_id": "lamp-3"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_totals_with_promo() {
        let (state, _) = state();
        let app = create_router(state);

        send(
            &app,
            Method::POST,
            "/api/v1/carts/s1/items",
            Some(json!({"product_id": "sofa-1", "quantity": 3})),
        )
        .await;

        let (status, body) =
            send(&app, Method::GET, "/api/v1/carts/s1/totals?promo_code=save10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subtotal"]["amount"], 13_799_700);
        assert_eq!(body["discount"]["amount"], 1_379_970);
        assert_eq!(body["delivery_fee"]["amount"], 0);
        assert_eq!(body["total"]["amount"], 12_419_730);
        assert_eq!(body["promo_valid"], true);

        let (_, body) =
            send(&app, Method::GET, "/api/v1/carts/s1/totals?promo_code=BOGUS", None).await;
        assert_eq!(body["promo_valid"], false);
        assert_eq!(body["discount"]["amount"], 0);
    }

    #[tokio::test]
    async fn test_clear_persists() {
        let (state, memory) = state();
        let store = state.store.clone();
        let app = create_router(state);

        send(
            &app,
            Method::POST,
            "/api/v1/carts/s1/items",
            Some(json!({"product_id": "lamp-3"})),
        )
        .await;
        let (_, body) = send(&app, Method::DELETE, "/api/v1/carts/s1", None).await;
        assert_eq!(body["is_empty"], true);

        store.flush().await;
        assert_eq!(memory.load("s1").unwrap(), Some(vec![]));
    }

    #[tokio::test]
    async fn test_checkout_and_payment() {
        let (state, memory) = state();
        let app = create_router(state.clone());

        send(
            &app,
            Method::POST,
            "/api/v1/carts/s1/items",
            Some(json!({"product_id": "lamp-3"})),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/carts/s1/checkout",
            Some(json!({"shipping_address": address(), "payment_method": "online"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["order"]["pricing"]["delivery_fee"]["amount"], 9900);
        assert_eq!(body["order"]["status"], "pending_payment");
        assert_eq!(body["payment"]["provider"], "mock_gateway");
        let order_id = body["order"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/orders/{}/payment", order_id),
            Some(json!({"success": true, "payment_id": "pay_123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order"]["status"], "confirmed");
        assert_eq!(body["outcome"]["status"], "succeeded");

        let (_, cart) = send(&app, Method::GET, "/api/v1/carts/s1", None).await;
        assert_eq!(cart["is_empty"], true);
        assert_eq!(state.open_sessions(), 0);
        state.store.flush().await;
        assert_eq!(memory.load("s1").unwrap(), None);

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/orders/{}/payment", order_id),
            Some(json!({"success": true, "payment_id": "pay_123"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) =
            send(&app, Method::GET, &format!("/api/v1/orders/{}", order_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["payment_id"], "pay_123");
    }

    #[tokio::test]
    async fn test_failed_payment_keeps_cart() {
        let (state, _) = state();
        let app = create_router(state);

        send(
            &app,
            Method::POST,
            "/api/v1/carts/s1/items",
            Some(json!({"product_id": "lamp-3"})),
        )
        .await;
        let (_, body) = send(
            &app,
            Method::POST,
            "/api/v1/carts/s1/checkout",
            Some(json!({"shipping_address": address(), "payment_method": "online"})),
        )
        .await;
        let order_id = body["order"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/orders/{}/payment", order_id),
            Some(json!({"success": false, "reason": "card declined"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order"]["status"], "payment_failed");

        let (_, cart) = send(&app, Method::GET, "/api/v1/carts/s1", None).await;
        assert_eq!(cart["total_items"], 1);
    }

    #[tokio::test]
    async fn test_checkout_rejections() {
        let (state, _) = state();
        let app = create_router(state);
        let uri = "/api/v1/carts/s1/checkout";

        let (status, _) = send(&app, Method::POST, uri, Some(json!({"shipping_address": address()}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        send(
            &app,
            Method::POST,
            "/api/v1/carts/s1/items",
            Some(json!({"product_id": "lamp-3"})),
        )
        .await;

        let (status, _) = send(
            &app,
            Method::POST,
            uri,
            Some(json!({"shipping_address": address(), "promo_code": "BOGUS"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut bad_address = address();
        bad_address["pincode"] = json!("12");
        let (status, _) = send(&app, Method::POST, uri, Some(json!({"shipping_address": bad_address}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(
            &app,
            Method::POST,
            uri,
            Some(json!({"shipping_address": address(), "payment_method": "cash_on_delivery"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["payment"]["provider"], "cod");

        let order_id = body["order"]["id"].as_str().unwrap().to_string();
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/orders/{}/payment", order_id),
            Some(json!({"success": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order"]["status"], "confirmed");
    }
}
