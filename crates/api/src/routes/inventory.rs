//! Stock level endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{ProductId, VariantId};
use domain::ResizeOutcome;
use serde::{Deserialize, Serialize};
use store::Store;

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ResizeRequest {
    pub count: u32,
}

#[derive(Serialize)]
pub struct StockResponse {
    pub variant_id: VariantId,
    pub available: u64,
}

#[derive(Serialize)]
pub struct RemovedResponse {
    pub product_id: ProductId,
    pub removed: u64,
}

/// GET /inventory lists available counts for every stocked variant.
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<StockResponse>>, ApiError> {
    let mut stock: Vec<StockResponse> = state
        .ledger
        .all_available_counts()
        .await?
        .into_iter()
        .map(|(variant_id, available)| StockResponse {
            variant_id,
            available,
        })
        .collect();
    stock.sort_by_key(|s| s.variant_id);
    Ok(Json(stock))
}

/// GET /inventory/variants/{variant_id}
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<StockResponse>, ApiError> {
    let variant_id: VariantId = parse_id(&id)?;
    let available = state.ledger.available_count(variant_id).await?;
    Ok(Json(StockResponse {
        variant_id,
        available,
    }))
}

/// PUT /inventory/products/{product_id}/variants/{variant_id} sets the available count.
#[tracing::instrument(skip(state, req), fields(count = req.count))]
pub async fn resize<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path((product, variant)): Path<(String, String)>,
    Json(req): Json<ResizeRequest>,
) -> Result<Json<ResizeOutcome>, ApiError> {
    let product_id: ProductId = parse_id(&product)?;
    let variant_id: VariantId = parse_id(&variant)?;
    let outcome = state
        .ledger
        .resize(product_id, variant_id, req.count)
        .await?;
    Ok(Json(outcome))
}

/// DELETE /inventory/products/{product_id} drops the product's available units.
#[tracing::instrument(skip(state))]
pub async fn remove_product<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    let removed = state.ledger.remove_product_stock(product_id).await?;
    Ok(Json(RemovedResponse {
        product_id,
        removed,
    }))
}
