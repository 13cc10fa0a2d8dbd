//! Allocation planning service
//!
//! Queries the available lots for a product and runs the pure planner from
//! the shared crate. Planning never mutates the ledger; applying a plan is
//! the inventory service's job.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::allocation::{plan_allocation, AllocationError, AvailableLot};
use shared::models::{AllocationResult, CostMethod, SpecificAllocation};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Allocation planning service
#[derive(Clone)]
pub struct AllocationService {
    db: PgPool,
}

/// Input for planning an allocation
#[derive(Debug, Deserialize)]
pub struct AllocateInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub method: CostMethod,
    /// Restrict lot selection to one warehouse
    pub warehouse_id: Option<Uuid>,
    /// Required for the specific cost method, ignored otherwise
    pub specific_allocations: Option<Vec<SpecificAllocation>>,
}

/// Row for the available-lot query
#[derive(Debug, FromRow)]
struct AvailableLotRow {
    batch_id: Uuid,
    received_date: chrono::NaiveDate,
    batch_created_at: DateTime<Utc>,
    available: Decimal,
    cost_per_unit: Decimal,
}

impl From<AvailableLotRow> for AvailableLot {
    fn from(row: AvailableLotRow) -> Self {
        AvailableLot {
            batch_id: row.batch_id,
            received_date: row.received_date,
            batch_created_at: row.batch_created_at,
            available: row.available,
            cost_per_unit: row.cost_per_unit,
        }
    }
}

impl AllocationService {
    /// Create a new AllocationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Plan an allocation for a product under the requested cost method
    pub async fn allocate(&self, input: AllocateInput) -> AppResult<Vec<AllocationResult>> {
        let product_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(input.product_id)
                .fetch_one(&self.db)
                .await?;
        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let lots = self
            .available_lots(input.product_id, input.warehouse_id)
            .await?;

        plan_allocation(
            &lots,
            input.quantity,
            input.method,
            input.specific_allocations.as_deref(),
        )
        .map_err(map_allocation_error)
    }

    /// Snapshot of available lots: confirmed batches with available quantity,
    /// oldest received first (creation time, then id, breaks same-day ties)
    async fn available_lots(
        &self,
        product_id: Uuid,
        warehouse_id: Option<Uuid>,
    ) -> AppResult<Vec<AvailableLot>> {
        let rows = sqlx::query_as::<_, AvailableLotRow>(
            r#"
            SELECT il.batch_id,
                   b.received_date,
                   b.created_at AS batch_created_at,
                   il.quantity - il.reserved_quantity AS available,
                   b.cost_per_unit
            FROM inventory_levels il
            JOIN batches b ON b.id = il.batch_id
            WHERE il.product_id = $1
              AND b.status = 'confirmed'
              AND il.quantity - il.reserved_quantity > 0
              AND ($2::uuid IS NULL OR il.warehouse_id = $2)
            ORDER BY b.received_date, b.created_at, b.id
            "#,
        )
        .bind(product_id)
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(AvailableLot::from).collect())
    }
}

/// Map planner failures onto the application error taxonomy
fn map_allocation_error(err: AllocationError) -> AppError {
    match err {
        AllocationError::NonPositiveDemand => AppError::Validation {
            field: "quantity".to_string(),
            message: err.to_string(),
        },
        AllocationError::MissingSpecificAllocations => AppError::Validation {
            field: "specific_allocations".to_string(),
            message: err.to_string(),
        },
        AllocationError::InsufficientAvailable { .. }
        | AllocationError::InsufficientInBatch { .. }
        | AllocationError::UnknownBatch(_) => AppError::InsufficientInventory(err.to_string()),
    }
}
