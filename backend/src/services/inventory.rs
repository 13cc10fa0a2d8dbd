//! Inventory ledger service
//!
//! The ledger row (product, batch, warehouse) holds on-hand and reserved
//! quantities; `0 <= reserved <= quantity` must hold at all times. Reserve,
//! release and deduct apply a whole allocation plan inside one transaction:
//! every UPDATE carries its invariant in the WHERE clause, so a row that
//! would be driven out of bounds matches nothing and the entire plan rolls
//! back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::costing::{round_money, unit_cost};
use shared::models::{AllocationResult, InventoryLevel, ProductInventorySummary};
use shared::validation::validate_positive_quantity;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Inventory ledger service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Database row for a ledger entry
#[derive(Debug, FromRow)]
struct InventoryLevelRow {
    id: Uuid,
    product_id: Uuid,
    batch_id: Uuid,
    warehouse_id: Uuid,
    quantity: Decimal,
    reserved_quantity: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<InventoryLevelRow> for InventoryLevel {
    fn from(row: InventoryLevelRow) -> Self {
        InventoryLevel {
            id: row.id,
            product_id: row.product_id,
            batch_id: row.batch_id,
            warehouse_id: row.warehouse_id,
            quantity: row.quantity,
            reserved_quantity: row.reserved_quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for receiving batch stock into a warehouse
#[derive(Debug, Deserialize)]
pub struct ReceiveInput {
    pub batch_id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity: Decimal,
}

/// An allocation plan applied to one warehouse
#[derive(Debug, Deserialize)]
pub struct ApplyPlanInput {
    pub warehouse_id: Uuid,
    pub plan: Vec<AllocationResult>,
}

/// Row for the product summary query
#[derive(Debug, FromRow)]
struct SummaryRow {
    total_quantity: Decimal,
    total_reserved: Decimal,
    total_value: Decimal,
}

const LEVEL_COLUMNS: &str =
    "id, product_id, batch_id, warehouse_id, quantity, reserved_quantity, created_at, updated_at";

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Receive batch stock: upsert the ledger row, incrementing on-hand
    /// quantity and never touching the reservation
    pub async fn receive_from_batch(&self, input: ReceiveInput) -> AppResult<InventoryLevel> {
        validate_positive_quantity(input.quantity).map_err(|message| AppError::Validation {
            field: "quantity".to_string(),
            message: message.to_string(),
        })?;

        let batch_product = sqlx::query_scalar::<_, Uuid>(
            "SELECT product_id FROM batches WHERE id = $1",
        )
        .bind(input.batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        if batch_product != input.product_id {
            return Err(AppError::Validation {
                field: "product_id".to_string(),
                message: "Batch belongs to a different product".to_string(),
            });
        }

        let row = sqlx::query_as::<_, InventoryLevelRow>(&format!(
            r#"
            INSERT INTO inventory_levels (product_id, batch_id, warehouse_id, quantity, reserved_quantity)
            VALUES ($1, $2, $3, $4, 0)
            ON CONFLICT (product_id, batch_id, warehouse_id)
            DO UPDATE SET quantity = inventory_levels.quantity + EXCLUDED.quantity,
                          updated_at = NOW()
            RETURNING {LEVEL_COLUMNS}
            "#,
        ))
        .bind(input.product_id)
        .bind(input.batch_id)
        .bind(input.warehouse_id)
        .bind(input.quantity)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            batch_id = %input.batch_id,
            warehouse_id = %input.warehouse_id,
            quantity = %input.quantity,
            "Received batch stock"
        );
        Ok(row.into())
    }

    /// Reserve stock for every line of an allocation plan, atomically
    ///
    /// Availability is re-validated inside the transaction, so a plan built
    /// from a stale snapshot fails here instead of overcommitting.
    pub async fn reserve(&self, input: ApplyPlanInput) -> AppResult<Vec<InventoryLevel>> {
        self.apply_plan(
            input,
            "UPDATE inventory_levels \
             SET reserved_quantity = reserved_quantity + $1, updated_at = NOW() \
             WHERE batch_id = $2 AND warehouse_id = $3 \
               AND quantity - reserved_quantity >= $1",
            "available",
        )
        .await
    }

    /// Release a previous reservation, atomically
    pub async fn release(&self, input: ApplyPlanInput) -> AppResult<Vec<InventoryLevel>> {
        self.apply_plan(
            input,
            "UPDATE inventory_levels \
             SET reserved_quantity = reserved_quantity - $1, updated_at = NOW() \
             WHERE batch_id = $2 AND warehouse_id = $3 \
               AND reserved_quantity >= $1",
            "reserved",
        )
        .await
    }

    /// Deduct on shipment: physical stock leaves and its reservation is
    /// cleared in the same step, atomically
    pub async fn deduct(&self, input: ApplyPlanInput) -> AppResult<Vec<InventoryLevel>> {
        self.apply_plan(
            input,
            "UPDATE inventory_levels \
             SET quantity = quantity - $1, reserved_quantity = reserved_quantity - $1, \
                 updated_at = NOW() \
             WHERE batch_id = $2 AND warehouse_id = $3 \
               AND reserved_quantity >= $1 AND quantity >= $1",
            "reserved",
        )
        .await
    }

    /// List ledger rows for a product, optionally for one warehouse
    pub async fn get_levels(
        &self,
        product_id: Uuid,
        warehouse_id: Option<Uuid>,
    ) -> AppResult<Vec<InventoryLevel>> {
        let rows = sqlx::query_as::<_, InventoryLevelRow>(&format!(
            r#"
            SELECT {LEVEL_COLUMNS}
            FROM inventory_levels
            WHERE product_id = $1
              AND ($2::uuid IS NULL OR warehouse_id = $2)
            ORDER BY created_at
            "#,
        ))
        .bind(product_id)
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(InventoryLevel::from).collect())
    }

    /// Aggregate stock position for a product across batches and warehouses
    pub async fn get_summary_by_product(
        &self,
        product_id: Uuid,
    ) -> AppResult<ProductInventorySummary> {
        let product_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(product_id)
                .fetch_one(&self.db)
                .await?;
        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT COALESCE(SUM(il.quantity), 0) AS total_quantity,
                   COALESCE(SUM(il.reserved_quantity), 0) AS total_reserved,
                   COALESCE(SUM(il.quantity * b.cost_per_unit), 0) AS total_value
            FROM inventory_levels il
            JOIN batches b ON b.id = il.batch_id
            WHERE il.product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(ProductInventorySummary {
            product_id,
            total_quantity: row.total_quantity,
            total_reserved: row.total_reserved,
            available_quantity: row.total_quantity - row.total_reserved,
            total_value: round_money(row.total_value),
            avg_cost_per_unit: unit_cost(row.total_value, row.total_quantity),
        })
    }

    /// Run one guarded UPDATE per plan line inside a single transaction
    ///
    /// A line whose guard matches no row fails the whole plan: either the
    /// ledger row does not exist, or the update would break an invariant, in
    /// which case the error reports how far short the row is.
    async fn apply_plan(
        &self,
        input: ApplyPlanInput,
        update_sql: &str,
        limit_name: &str,
    ) -> AppResult<Vec<InventoryLevel>> {
        if input.plan.is_empty() {
            return Err(AppError::Validation {
                field: "plan".to_string(),
                message: "Allocation plan cannot be empty".to_string(),
            });
        }
        for line in &input.plan {
            validate_positive_quantity(line.quantity).map_err(|message| {
                AppError::Validation {
                    field: "plan".to_string(),
                    message: message.to_string(),
                }
            })?;
        }

        let mut tx = self.db.begin().await?;
        let mut updated_ids = Vec::with_capacity(input.plan.len());

        for line in &input.plan {
            let result = sqlx::query(update_sql)
                .bind(line.quantity)
                .bind(line.batch_id)
                .bind(input.warehouse_id)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                return Err(self
                    .plan_line_failure(&mut tx, line, input.warehouse_id, limit_name)
                    .await?);
            }
            updated_ids.push(line.batch_id);
        }

        let rows = sqlx::query_as::<_, InventoryLevelRow>(&format!(
            r#"
            SELECT {LEVEL_COLUMNS}
            FROM inventory_levels
            WHERE warehouse_id = $1 AND batch_id = ANY($2)
            ORDER BY created_at
            "#,
        ))
        .bind(input.warehouse_id)
        .bind(&updated_ids)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rows.into_iter().map(InventoryLevel::from).collect())
    }

    /// Build the error for a plan line whose guarded update matched nothing
    async fn plan_line_failure(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        line: &AllocationResult,
        warehouse_id: Uuid,
        limit_name: &str,
    ) -> AppResult<AppError> {
        let row = sqlx::query_as::<_, (Decimal, Decimal)>(
            "SELECT quantity, reserved_quantity FROM inventory_levels \
             WHERE batch_id = $1 AND warehouse_id = $2",
        )
        .bind(line.batch_id)
        .bind(warehouse_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(match row {
            None => AppError::NotFound("Inventory level".to_string()),
            Some((quantity, reserved)) => {
                let limit = if limit_name == "available" {
                    quantity - reserved
                } else {
                    reserved
                };
                AppError::InsufficientInventory(format!(
                    "Batch {}: requested {}, {} {} (short by {})",
                    line.batch_id,
                    line.quantity,
                    limit_name,
                    limit,
                    line.quantity - limit
                ))
            }
        })
    }
}
