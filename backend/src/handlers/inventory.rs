//! HTTP handlers for inventory ledger and allocation endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::models::{AllocationResult, InventoryLevel, ProductInventorySummary};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::allocation::{AllocateInput, AllocationService};
use crate::services::inventory::{ApplyPlanInput, InventoryService, ReceiveInput};
use crate::AppState;

/// Query parameters for listing ledger rows
#[derive(Debug, Deserialize)]
pub struct LevelsQuery {
    pub warehouse_id: Option<Uuid>,
}

/// Receive batch stock into a warehouse
pub async fn receive_inventory(
    State(state): State<AppState>,
    Json(input): Json<ReceiveInput>,
) -> AppResult<Json<InventoryLevel>> {
    let service = InventoryService::new(state.db);
    let level = service.receive_from_batch(input).await?;
    Ok(Json(level))
}

/// Plan an allocation for a product
pub async fn allocate_inventory(
    State(state): State<AppState>,
    Json(input): Json<AllocateInput>,
) -> AppResult<Json<Vec<AllocationResult>>> {
    let service = AllocationService::new(state.db);
    let plan = service.allocate(input).await?;
    Ok(Json(plan))
}

/// Reserve stock for an allocation plan
pub async fn reserve_inventory(
    State(state): State<AppState>,
    Json(input): Json<ApplyPlanInput>,
) -> AppResult<Json<Vec<InventoryLevel>>> {
    let service = InventoryService::new(state.db);
    let levels = service.reserve(input).await?;
    Ok(Json(levels))
}

/// Release a previous reservation
pub async fn release_reservation(
    State(state): State<AppState>,
    Json(input): Json<ApplyPlanInput>,
) -> AppResult<Json<Vec<InventoryLevel>>> {
    let service = InventoryService::new(state.db);
    let levels = service.release(input).await?;
    Ok(Json(levels))
}

/// Deduct stock on shipment
pub async fn deduct_inventory(
    State(state): State<AppState>,
    Json(input): Json<ApplyPlanInput>,
) -> AppResult<Json<Vec<InventoryLevel>>> {
    let service = InventoryService::new(state.db);
    let levels = service.deduct(input).await?;
    Ok(Json(levels))
}

/// List ledger rows for a product
pub async fn get_inventory_levels(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<LevelsQuery>,
) -> AppResult<Json<Vec<InventoryLevel>>> {
    let service = InventoryService::new(state.db);
    let levels = service.get_levels(product_id, query.warehouse_id).await?;
    Ok(Json(levels))
}

/// Get the aggregated stock position for a product
pub async fn get_inventory_summary(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductInventorySummary>> {
    let service = InventoryService::new(state.db);
    let summary = service.get_summary_by_product(product_id).await?;
    Ok(Json(summary))
}
