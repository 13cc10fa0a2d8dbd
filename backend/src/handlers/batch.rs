//! HTTP handlers for batch costing endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::models::Batch;
use shared::types::{PaginatedResponse, Pagination};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::batch::{
    BatchService, BatchWithCostItems, ConfirmBatchInput, CreateBatchInput, LandedCostItemInput,
    UpdateLandedCostItemInput,
};
use crate::AppState;

/// Query parameters for listing batches
#[derive(Debug, Deserialize)]
pub struct ListBatchesQuery {
    pub product_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Create a batch on goods receipt
pub async fn create_batch(
    State(state): State<AppState>,
    Json(input): Json<CreateBatchInput>,
) -> AppResult<Json<Batch>> {
    let service = BatchService::new(state.db);
    let batch = service
        .create_batch(
            input,
            &state.config.inventory.batch_number_prefix,
            &state.config.inventory.default_currency,
        )
        .await?;
    Ok(Json(batch))
}

/// Get a batch with its landed cost items
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<BatchWithCostItems>> {
    let service = BatchService::new(state.db);
    let batch = service.get_batch(batch_id).await?;
    Ok(Json(batch))
}

/// List batches
pub async fn list_batches(
    State(state): State<AppState>,
    Query(query): Query<ListBatchesQuery>,
) -> AppResult<Json<PaginatedResponse<Batch>>> {
    let defaults = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let service = BatchService::new(state.db);
    let batches = service.list_batches(query.product_id, pagination).await?;
    Ok(Json(batches))
}

/// Add a landed cost item to a draft batch
pub async fn add_landed_cost_item(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<LandedCostItemInput>,
) -> AppResult<Json<BatchWithCostItems>> {
    let service = BatchService::new(state.db);
    let batch = service.add_landed_cost_item(batch_id, input).await?;
    Ok(Json(batch))
}

/// Update a landed cost item on a draft batch
pub async fn update_landed_cost_item(
    State(state): State<AppState>,
    Path((batch_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateLandedCostItemInput>,
) -> AppResult<Json<BatchWithCostItems>> {
    let service = BatchService::new(state.db);
    let batch = service
        .update_landed_cost_item(batch_id, item_id, input)
        .await?;
    Ok(Json(batch))
}

/// Remove a landed cost item from a draft batch
pub async fn remove_landed_cost_item(
    State(state): State<AppState>,
    Path((batch_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<BatchWithCostItems>> {
    let service = BatchService::new(state.db);
    let batch = service.remove_landed_cost_item(batch_id, item_id).await?;
    Ok(Json(batch))
}

/// Recalculate a draft batch's cost totals
pub async fn recalculate_batch_costs(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<Batch>> {
    let service = BatchService::new(state.db);
    let batch = service.recalculate_costs(batch_id).await?;
    Ok(Json(batch))
}

/// Confirm a batch, freezing its valuation
pub async fn confirm_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<ConfirmBatchInput>,
) -> AppResult<Json<Batch>> {
    let service = BatchService::new(state.db);
    let batch = service.confirm_batch(batch_id, input).await?;
    Ok(Json(batch))
}

/// Cancel a draft batch
pub async fn cancel_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<Batch>> {
    let service = BatchService::new(state.db);
    let batch = service.cancel_batch(batch_id).await?;
    Ok(Json(batch))
}
