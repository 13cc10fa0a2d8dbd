//! HTTP handlers for warehouse endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use shared::models::Warehouse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::warehouse::{CreateWarehouseInput, WarehouseService};
use crate::AppState;

/// Create a warehouse
pub async fn create_warehouse(
    State(state): State<AppState>,
    Json(input): Json<CreateWarehouseInput>,
) -> AppResult<Json<Warehouse>> {
    let service = WarehouseService::new(state.db);
    let warehouse = service.create_warehouse(input).await?;
    Ok(Json(warehouse))
}

/// Get a warehouse by ID
pub async fn get_warehouse(
    State(state): State<AppState>,
    Path(warehouse_id): Path<Uuid>,
) -> AppResult<Json<Warehouse>> {
    let service = WarehouseService::new(state.db);
    let warehouse = service.get_warehouse(warehouse_id).await?;
    Ok(Json(warehouse))
}

/// List all warehouses
pub async fn list_warehouses(State(state): State<AppState>) -> AppResult<Json<Vec<Warehouse>>> {
    let service = WarehouseService::new(state.db);
    let warehouses = service.list_warehouses().await?;
    Ok(Json(warehouses))
}
