//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::{AppState, Config};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{OrderId, OrderStatus, ProductId, UserId, VariantId};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup_with_state() -> (axum::Router, Arc<AppState<InMemoryStore>>) {
    let state = api::create_default_state(InMemoryStore::new(), &Config::default());
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

fn setup() -> axum::Router {
    setup_with_state().0
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn stock(app: &axum::Router, product: ProductId, variant: VariantId, count: u32) {
    let (status, _) = send(
        app,
        "PUT",
        &format!("/inventory/products/{product}/variants/{variant}"),
        Some(json!({ "count": count })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

fn checkout_body(
    user: UserId,
    product: ProductId,
    variant: VariantId,
    count: u32,
    payment: &str,
    delivery: &str,
) -> Value {
    json!({
        "user_id": user,
        "items": [{
            "product_id": product,
            "variant_id": variant,
            "count": count,
            "unit_price": 1500
        }],
        "checkout": {
            "delivery_type": delivery,
            "payment_type": payment
        }
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_resize_and_read_stock() {
    let app = setup();
    let (product, variant) = (ProductId::new(), VariantId::new());

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/inventory/products/{product}/variants/{variant}"),
        Some(json!({ "count": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["added"], 4);
    assert_eq!(json["removed"], 0);

    let (status, json) = send(&app, "GET", &format!("/inventory/variants/{variant}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["available"], 4);

    let (_, json) = send(&app, "GET", "/inventory", None).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_resize_over_limit_is_rejected() {
    let app = setup();

    let (status, json) = send(
        &app,
        "PUT",
        &format!(
            "/inventory/products/{}/variants/{}",
            ProductId::new(),
            VariantId::new()
        ),
        Some(json!({ "count": 1001 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_remove_product_stock() {
    let app = setup();
    let (product, variant) = (ProductId::new(), VariantId::new());
    stock(&app, product, variant, 3).await;

    let (status, json) = send(&app, "DELETE", &format!("/inventory/products/{product}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 3);
    let (_, json) = send(&app, "GET", &format!("/inventory/variants/{variant}"), None).await;
    assert_eq!(json["available"], 0);
}

#[tokio::test]
async fn test_checkout_creates_order_and_reserves_stock() {
    let app = setup();
    let (user, product, variant) = (UserId::new(), ProductId::new(), VariantId::new());
    stock(&app, product, variant, 3).await;

    let (status, json) = send(
        &app,
        "POST",
        "/orders",
        Some(checkout_body(user, product, variant, 2, "Card", "Mail")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = json["order_id"].as_str().unwrap().to_string();

    let (status, order) = send(&app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "WaitingPayment");
    assert_eq!(order["user_id"], json!(user));

    let (_, json) = send(&app, "GET", &format!("/inventory/variants/{variant}"), None).await;
    assert_eq!(json["available"], 1);
}

#[tokio::test]
async fn test_checkout_without_stock_conflicts() {
    let (app, state) = setup_with_state();
    let (user, product, variant) = (UserId::new(), ProductId::new(), VariantId::new());
    stock(&app, product, variant, 1).await;

    let (status, json) = send(
        &app,
        "POST",
        "/orders",
        Some(checkout_body(user, product, variant, 2, "Card", "Mail")),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].is_string());
    assert!(state.lifecycle.all_orders().await.unwrap().is_empty());
    assert_eq!(state.ledger.available_count(variant).await.unwrap(), 1);
}

#[tokio::test]
async fn test_empty_cart_is_bad_request() {
    let app = setup();

    let (status, _) = send(
        &app,
        "POST",
        "/orders",
        Some(json!({
            "user_id": UserId::new(),
            "items": [],
            "checkout": { "delivery_type": "Mail", "payment_type": "Card" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overflowing_price_is_bad_request() {
    let (app, state) = setup_with_state();
    let (user, product, variant) = (UserId::new(), ProductId::new(), VariantId::new());
    stock(&app, product, variant, 2).await;

    let mut body = checkout_body(user, product, variant, 2, "Card", "SelfPickup");
    body["items"][0]["unit_price"] = json!(i64::MAX / 2 + 1);
    let (status, json) = send(&app, "POST", "/orders", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Invalid price"));
    assert!(state.lifecycle.all_orders().await.unwrap().is_empty());
    assert_eq!(state.ledger.available_count(variant).await.unwrap(), 2);
}

#[tokio::test]
async fn test_payment_moves_mail_order_to_packing() {
    let app = setup();
    let (user, product, variant) = (UserId::new(), ProductId::new(), VariantId::new());
    stock(&app, product, variant, 1).await;
    let (_, json) = send(
        &app,
        "POST",
        "/orders",
        Some(checkout_body(user, product, variant, 1, "Wallet", "Mail")),
    )
    .await;
    let order_id = json["order_id"].as_str().unwrap().to_string();

    let (status, json) = send(&app, "POST", &format!("/orders/{order_id}/payment"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["changed"], true);

    let (_, order) = send(&app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(order["status"], "Packing");

    // A second confirmation finds the order already moved on.
    let (status, json) = send(&app, "POST", &format!("/orders/{order_id}/payment"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["changed"], false);
}

#[tokio::test]
async fn test_rejecting_cash_order_restores_stock() {
    let app = setup();
    let (user, product, variant) = (UserId::new(), ProductId::new(), VariantId::new());
    stock(&app, product, variant, 2).await;
    let (_, json) = send(
        &app,
        "POST",
        "/orders",
        Some(checkout_body(user, product, variant, 2, "Cash", "SelfPickup")),
    )
    .await;
    let order_id = json["order_id"].as_str().unwrap().to_string();

    let (status, json) = send(
        &app,
        "POST",
        &format!("/orders/{order_id}/status"),
        Some(json!({ "from": OrderStatus::WaitingApprove, "to": OrderStatus::Deleted })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["changed"], true);
    let (_, json) = send(&app, "GET", &format!("/inventory/variants/{variant}"), None).await;
    assert_eq!(json["available"], 2);
}

#[tokio::test]
async fn test_illegal_transition_conflicts() {
    let app = setup();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/orders/{}/status", OrderId::new()),
        Some(json!({ "from": "Shipped", "to": "Creating" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_user_orders_are_scoped() {
    let app = setup();
    let (owner, other) = (UserId::new(), UserId::new());
    let (product, variant) = (ProductId::new(), VariantId::new());
    stock(&app, product, variant, 1).await;
    let (_, json) = send(
        &app,
        "POST",
        "/orders",
        Some(checkout_body(owner, product, variant, 1, "Card", "SelfPickup")),
    )
    .await;
    let order_id = json["order_id"].as_str().unwrap().to_string();

    let (_, json) = send(&app, "GET", &format!("/users/{owner}/orders"), None).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    let (_, json) = send(&app, "GET", &format!("/users/{other}/orders"), None).await;
    assert!(json.as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        "GET",
        &format!("/users/{owner}/orders/{order_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        "GET",
        &format!("/users/{other}/orders/{order_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_nonexistent_order() {
    let app = setup();

    let (status, _) = send(&app, "GET", &format!("/orders/{}", OrderId::new()), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_id_format() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/orders/not-a-uuid", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Invalid ID"));
}
