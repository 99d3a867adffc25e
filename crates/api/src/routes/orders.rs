//! Checkout, order lookup and status change endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::CheckoutOutcome;
use common::{Cart, CartItem, CheckoutParameters, Order, OrderId, OrderStatus, UserId};
use serde::{Deserialize, Serialize};
use store::Store;

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub checkout: CheckoutParameters,
}

#[derive(Deserialize)]
pub struct ChangeStatusRequest {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: OrderId,
}

#[derive(Serialize)]
pub struct StatusChangeResponse {
    pub order_id: OrderId,
    pub changed: bool,
}

// -- Handlers --

/// POST /orders turns the submitted cart into an order.
///
/// Responds 409 when some line cannot be reserved.
#[tracing::instrument(skip(state, req), fields(user_id = %req.user_id))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let cart = Cart::new(req.user_id, req.items);

    match state
        .coordinator
        .create_order_from_cart(&cart, req.checkout)
        .await?
    {
        CheckoutOutcome::Created(order_id) => {
            Ok((StatusCode::CREATED, Json(OrderCreatedResponse { order_id })))
        }
        CheckoutOutcome::InsufficientInventory => Err(ApiError::Conflict(
            "Not enough stock for one or more items".to_string(),
        )),
    }
}

/// GET /orders lists every order, newest first.
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.lifecycle.all_orders().await?))
}

/// GET /orders/{id}
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    state
        .lifecycle
        .find_order(order_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Order {order_id} not found")))
}

/// POST /orders/{id}/status moves an order from `from` to `to`.
///
/// `changed` is false when the order was no longer in `from`.
#[tracing::instrument(skip(state, req))]
pub async fn change_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let changed = state
        .lifecycle
        .change_status(order_id, req.from, req.to)
        .await?;
    Ok(Json(StatusChangeResponse { order_id, changed }))
}

/// POST /orders/{id}/payment records a confirmed payment.
#[tracing::instrument(skip(state))]
pub async fn confirm_payment<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let changed = state.lifecycle.confirm_payment(order_id).await?;
    Ok(Json(StatusChangeResponse { order_id, changed }))
}

/// GET /users/{user_id}/orders
pub async fn list_for_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let user_id: UserId = parse_id(&id)?;
    Ok(Json(state.lifecycle.user_orders(user_id).await?))
}

/// GET /users/{user_id}/orders/{order_id} hides orders of other users.
pub async fn get_for_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path((user, order)): Path<(String, String)>,
) -> Result<Json<Order>, ApiError> {
    let user_id: UserId = parse_id(&user)?;
    let order_id: OrderId = parse_id(&order)?;
    state
        .lifecycle
        .user_order(user_id, order_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Order {order_id} not found")))
}
