//! HTTP adapter for checkout, order lifecycle and inventory.
//!
//! Serves JSON endpoints over the reservation engine, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", post(routes::orders::change_status::<S>))
        .route("/orders/{id}/payment", post(routes::orders::confirm_payment::<S>))
        .route(
            "/users/{user_id}/orders",
            get(routes::orders::list_for_user::<S>),
        )
        .route(
            "/users/{user_id}/orders/{order_id}",
            get(routes::orders::get_for_user::<S>),
        )
        .route("/inventory", get(routes::inventory::list::<S>))
        .route(
            "/inventory/variants/{variant_id}",
            get(routes::inventory::get::<S>),
        )
        .route(
            "/inventory/products/{product_id}",
            delete(routes::inventory::remove_product::<S>),
        )
        .route(
            "/inventory/products/{product_id}/variants/{variant_id}",
            put(routes::inventory::resize::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a store using the configured policy.
pub fn create_default_state<S: Store>(store: S, config: &Config) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store, config.reservation_policy()))
}
