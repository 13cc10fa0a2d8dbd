//! Batch costing service
//!
//! Batches are created on goods receipt in draft, accumulate landed cost
//! items while in draft, and freeze their valuation on confirmation. Every
//! landed cost mutation re-runs the totals recalculation inside the same
//! transaction, so `total_cost = total_purchase_cost + total_landed_cost`
//! holds for every committed row.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::costing::{amount_in_batch_currency, compute_batch_totals};
use shared::models::{Batch, BatchStatus, LandedCostItem};
use shared::types::{Clock, PaginatedResponse, Pagination};
use shared::validation::{
    validate_currency_code, validate_exchange_rate, validate_non_negative_amount,
    validate_positive_quantity,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::numbering::NumberingService;

/// Document type key for batch numbers in the sequence table
const BATCH_DOC_TYPE: &str = "batch";

/// Batch costing service
#[derive(Clone)]
pub struct BatchService {
    db: PgPool,
    clock: Clock,
}

/// Database row for a batch
#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    batch_number: String,
    product_id: Uuid,
    warehouse_id: Uuid,
    supplier_name: Option<String>,
    quantity_received: Decimal,
    unit_purchase_cost: Decimal,
    currency: String,
    total_purchase_cost: Decimal,
    total_landed_cost: Decimal,
    total_cost: Decimal,
    cost_per_unit: Decimal,
    status: String,
    received_date: NaiveDate,
    confirmed_at: Option<DateTime<Utc>>,
    confirmed_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BatchRow {
    fn into_model(self) -> AppResult<Batch> {
        let status = BatchStatus::parse(&self.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown batch status: {}", self.status)))?;
        Ok(Batch {
            id: self.id,
            batch_number: self.batch_number,
            product_id: self.product_id,
            warehouse_id: self.warehouse_id,
            supplier_name: self.supplier_name,
            quantity_received: self.quantity_received,
            unit_purchase_cost: self.unit_purchase_cost,
            currency: self.currency,
            total_purchase_cost: self.total_purchase_cost,
            total_landed_cost: self.total_landed_cost,
            total_cost: self.total_cost,
            cost_per_unit: self.cost_per_unit,
            status,
            received_date: self.received_date,
            confirmed_at: self.confirmed_at,
            confirmed_by: self.confirmed_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Database row for a landed cost item
#[derive(Debug, FromRow)]
struct LandedCostItemRow {
    id: Uuid,
    batch_id: Uuid,
    cost_type: String,
    amount: Decimal,
    currency: String,
    exchange_rate: Decimal,
    amount_in_batch_currency: Decimal,
    description: Option<String>,
    reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LandedCostItemRow> for LandedCostItem {
    fn from(row: LandedCostItemRow) -> Self {
        LandedCostItem {
            id: row.id,
            batch_id: row.batch_id,
            cost_type: row.cost_type,
            amount: row.amount,
            currency: row.currency,
            exchange_rate: row.exchange_rate,
            amount_in_batch_currency: row.amount_in_batch_currency,
            description: row.description,
            reference: row.reference,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a batch on goods receipt
#[derive(Debug, Deserialize)]
pub struct CreateBatchInput {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub supplier_name: Option<String>,
    pub quantity_received: Decimal,
    pub unit_purchase_cost: Decimal,
    /// Defaults to the configured inventory currency
    pub currency: Option<String>,
    /// Defaults to today
    pub received_date: Option<NaiveDate>,
}

/// Input for adding a landed cost item to a draft batch
#[derive(Debug, Deserialize)]
pub struct LandedCostItemInput {
    pub cost_type: String,
    pub amount: Decimal,
    /// Defaults to the batch currency
    pub currency: Option<String>,
    /// Defaults to 1
    pub exchange_rate: Option<Decimal>,
    pub description: Option<String>,
    pub reference: Option<String>,
}

/// Input for updating a landed cost item
#[derive(Debug, Deserialize)]
pub struct UpdateLandedCostItemInput {
    pub cost_type: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub description: Option<String>,
    pub reference: Option<String>,
}

/// Input for confirming a batch
#[derive(Debug, Deserialize)]
pub struct ConfirmBatchInput {
    /// Actor stamped on the confirmation for audit
    pub confirmed_by: Uuid,
}

/// A batch together with its landed cost items
#[derive(Debug, serde::Serialize)]
pub struct BatchWithCostItems {
    #[serde(flatten)]
    pub batch: Batch,
    pub landed_cost_items: Vec<LandedCostItem>,
}

const BATCH_COLUMNS: &str = "id, batch_number, product_id, warehouse_id, supplier_name, \
     quantity_received, unit_purchase_cost, currency, total_purchase_cost, total_landed_cost, \
     total_cost, cost_per_unit, status, received_date, confirmed_at, confirmed_by, \
     created_at, updated_at";

const ITEM_COLUMNS: &str = "id, batch_id, cost_type, amount, currency, exchange_rate, \
     amount_in_batch_currency, description, reference, created_at, updated_at";

impl BatchService {
    /// Create a new BatchService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            clock: Clock::System,
        }
    }

    /// Create a service with a pinned clock (used by tests)
    pub fn with_clock(db: PgPool, clock: Clock) -> Self {
        Self { db, clock }
    }

    /// Create a batch on goods receipt, in draft status
    pub async fn create_batch(
        &self,
        input: CreateBatchInput,
        batch_number_prefix: &str,
        default_currency: &str,
    ) -> AppResult<Batch> {
        validate_non_negative_amount(input.quantity_received).map_err(|message| {
            AppError::Validation {
                field: "quantity_received".to_string(),
                message: message.to_string(),
            }
        })?;
        validate_non_negative_amount(input.unit_purchase_cost).map_err(|message| {
            AppError::Validation {
                field: "unit_purchase_cost".to_string(),
                message: message.to_string(),
            }
        })?;

        let currency = input
            .currency
            .unwrap_or_else(|| default_currency.to_string());
        validate_currency_code(&currency).map_err(|message| AppError::Validation {
            field: "currency".to_string(),
            message: message.to_string(),
        })?;

        let product_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(input.product_id)
                .fetch_one(&self.db)
                .await?;
        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let numbering = NumberingService::with_clock(self.db.clone(), self.clock);
        let batch_number = numbering
            .next_number(BATCH_DOC_TYPE, batch_number_prefix)
            .await?;

        let received_date = input.received_date.unwrap_or_else(|| self.clock.today());
        let totals = compute_batch_totals(input.quantity_received, input.unit_purchase_cost, &[]);

        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            INSERT INTO batches (
                batch_number, product_id, warehouse_id, supplier_name, quantity_received,
                unit_purchase_cost, currency, total_purchase_cost, total_landed_cost,
                total_cost, cost_per_unit, status, received_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'draft', $12)
            RETURNING {BATCH_COLUMNS}
            "#,
        ))
        .bind(&batch_number)
        .bind(input.product_id)
        .bind(input.warehouse_id)
        .bind(&input.supplier_name)
        .bind(input.quantity_received)
        .bind(input.unit_purchase_cost)
        .bind(&currency)
        .bind(totals.total_purchase_cost)
        .bind(totals.total_landed_cost)
        .bind(totals.total_cost)
        .bind(totals.cost_per_unit)
        .bind(received_date)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(batch_number = %batch_number, "Created batch");
        row.into_model()
    }

    /// Get a batch with its landed cost items
    pub async fn get_batch(&self, batch_id: Uuid) -> AppResult<BatchWithCostItems> {
        let batch = self.fetch_batch(batch_id).await?;

        let items = sqlx::query_as::<_, LandedCostItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM landed_cost_items WHERE batch_id = $1 ORDER BY created_at",
        ))
        .bind(batch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(BatchWithCostItems {
            batch,
            landed_cost_items: items.into_iter().map(LandedCostItem::from).collect(),
        })
    }

    /// List batches newest first, optionally filtered by product
    pub async fn list_batches(
        &self,
        product_id: Option<Uuid>,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Batch>> {
        let pagination = pagination.clamped();

        let total_items: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM batches WHERE ($1::uuid IS NULL OR product_id = $1)",
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM batches
            WHERE ($1::uuid IS NULL OR product_id = $1)
            ORDER BY received_date DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(product_id)
        .bind(pagination.per_page as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.db)
        .await?;

        let data: Vec<Batch> = rows
            .into_iter()
            .map(BatchRow::into_model)
            .collect::<AppResult<_>>()?;

        Ok(PaginatedResponse {
            data,
            pagination: pagination.meta(total_items as u64),
        })
    }

    /// Add a landed cost item to a draft batch and recalculate its totals
    pub async fn add_landed_cost_item(
        &self,
        batch_id: Uuid,
        input: LandedCostItemInput,
    ) -> AppResult<BatchWithCostItems> {
        let batch = self.fetch_batch(batch_id).await?;
        self.ensure_costs_mutable(&batch)?;

        validate_positive_quantity(input.amount).map_err(|message| AppError::Validation {
            field: "amount".to_string(),
            message: message.to_string(),
        })?;

        // Documented defaults: currency = batch currency, exchange rate = 1
        let currency = input.currency.unwrap_or_else(|| batch.currency.clone());
        let exchange_rate = input.exchange_rate.unwrap_or(Decimal::ONE);
        validate_currency_code(&currency).map_err(|message| AppError::Validation {
            field: "currency".to_string(),
            message: message.to_string(),
        })?;
        validate_exchange_rate(exchange_rate).map_err(|message| AppError::Validation {
            field: "exchange_rate".to_string(),
            message: message.to_string(),
        })?;

        let converted = amount_in_batch_currency(input.amount, exchange_rate);

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO landed_cost_items (
                batch_id, cost_type, amount, currency, exchange_rate,
                amount_in_batch_currency, description, reference
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(batch_id)
        .bind(&input.cost_type)
        .bind(input.amount)
        .bind(&currency)
        .bind(exchange_rate)
        .bind(converted)
        .bind(&input.description)
        .bind(&input.reference)
        .execute(&mut *tx)
        .await?;

        self.recalculate_in_tx(&mut tx, &batch).await?;
        tx.commit().await?;

        self.get_batch(batch_id).await
    }

    /// Update a landed cost item on a draft batch and recalculate
    pub async fn update_landed_cost_item(
        &self,
        batch_id: Uuid,
        item_id: Uuid,
        input: UpdateLandedCostItemInput,
    ) -> AppResult<BatchWithCostItems> {
        let batch = self.fetch_batch(batch_id).await?;
        self.ensure_costs_mutable(&batch)?;

        let existing = sqlx::query_as::<_, LandedCostItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM landed_cost_items WHERE id = $1 AND batch_id = $2",
        ))
        .bind(item_id)
        .bind(batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Landed cost item".to_string()))?;

        let cost_type = input.cost_type.unwrap_or(existing.cost_type);
        let amount = input.amount.unwrap_or(existing.amount);
        let currency = input.currency.unwrap_or(existing.currency);
        let exchange_rate = input.exchange_rate.unwrap_or(existing.exchange_rate);
        let description = input.description.or(existing.description);
        let reference = input.reference.or(existing.reference);

        validate_positive_quantity(amount).map_err(|message| AppError::Validation {
            field: "amount".to_string(),
            message: message.to_string(),
        })?;
        validate_currency_code(&currency).map_err(|message| AppError::Validation {
            field: "currency".to_string(),
            message: message.to_string(),
        })?;
        validate_exchange_rate(exchange_rate).map_err(|message| AppError::Validation {
            field: "exchange_rate".to_string(),
            message: message.to_string(),
        })?;

        let converted = amount_in_batch_currency(amount, exchange_rate);

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE landed_cost_items
            SET cost_type = $1, amount = $2, currency = $3, exchange_rate = $4,
                amount_in_batch_currency = $5, description = $6, reference = $7,
                updated_at = NOW()
            WHERE id = $8
            "#,
        )
        .bind(&cost_type)
        .bind(amount)
        .bind(&currency)
        .bind(exchange_rate)
        .bind(converted)
        .bind(&description)
        .bind(&reference)
        .bind(item_id)
        .execute(&mut *tx)
        .await?;

        self.recalculate_in_tx(&mut tx, &batch).await?;
        tx.commit().await?;

        self.get_batch(batch_id).await
    }

    /// Remove a landed cost item from a draft batch and recalculate
    pub async fn remove_landed_cost_item(
        &self,
        batch_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<BatchWithCostItems> {
        let batch = self.fetch_batch(batch_id).await?;
        self.ensure_costs_mutable(&batch)?;

        let mut tx = self.db.begin().await?;

        let result = sqlx::query("DELETE FROM landed_cost_items WHERE id = $1 AND batch_id = $2")
            .bind(item_id)
            .bind(batch_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Landed cost item".to_string()));
        }

        self.recalculate_in_tx(&mut tx, &batch).await?;
        tx.commit().await?;

        self.get_batch(batch_id).await
    }

    /// Re-sum landed cost items and recompute batch totals
    ///
    /// Idempotent: running it twice with no intervening item change yields
    /// identical totals.
    pub async fn recalculate_costs(&self, batch_id: Uuid) -> AppResult<Batch> {
        let batch = self.fetch_batch(batch_id).await?;
        self.ensure_costs_mutable(&batch)?;

        let mut tx = self.db.begin().await?;
        self.recalculate_in_tx(&mut tx, &batch).await?;
        tx.commit().await?;

        self.fetch_batch(batch_id).await
    }

    /// Confirm a batch: one final recalculation, then freeze the valuation
    pub async fn confirm_batch(
        &self,
        batch_id: Uuid,
        input: ConfirmBatchInput,
    ) -> AppResult<Batch> {
        let batch = self.fetch_batch(batch_id).await?;

        match batch.status {
            BatchStatus::Draft => {}
            BatchStatus::Confirmed => {
                return Err(AppError::InvalidStateTransition(format!(
                    "Batch {} is already confirmed",
                    batch.batch_number
                )));
            }
            BatchStatus::Cancelled => {
                return Err(AppError::InvalidStateTransition(format!(
                    "Batch {} is cancelled and cannot be confirmed",
                    batch.batch_number
                )));
            }
        }

        let mut tx = self.db.begin().await?;
        self.recalculate_in_tx(&mut tx, &batch).await?;

        // Guard on status so a concurrent confirm cannot apply twice
        let result = sqlx::query(
            r#"
            UPDATE batches
            SET status = 'confirmed', confirmed_at = $1, confirmed_by = $2, updated_at = NOW()
            WHERE id = $3 AND status = 'draft'
            "#,
        )
        .bind(self.clock.now())
        .bind(input.confirmed_by)
        .bind(batch_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InvalidStateTransition(format!(
                "Batch {} is no longer in draft",
                batch.batch_number
            )));
        }

        tx.commit().await?;
        tracing::info!(batch_number = %batch.batch_number, "Confirmed batch");

        self.fetch_batch(batch_id).await
    }

    /// Cancel a draft batch
    pub async fn cancel_batch(&self, batch_id: Uuid) -> AppResult<Batch> {
        let batch = self.fetch_batch(batch_id).await?;

        let result = sqlx::query(
            "UPDATE batches SET status = 'cancelled', updated_at = NOW() \
             WHERE id = $1 AND status = 'draft'",
        )
        .bind(batch_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InvalidStateTransition(format!(
                "Batch {} is not in draft and cannot be cancelled",
                batch.batch_number
            )));
        }

        self.fetch_batch(batch_id).await
    }

    async fn fetch_batch(&self, batch_id: Uuid) -> AppResult<Batch> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches WHERE id = $1",
        ))
        .bind(batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        row.into_model()
    }

    /// The confirmation gate: confirmed batches are immutable, cancelled ones
    /// take no further cost activity either
    fn ensure_costs_mutable(&self, batch: &Batch) -> AppResult<()> {
        match batch.status {
            BatchStatus::Draft => Ok(()),
            BatchStatus::Confirmed => Err(AppError::BatchImmutable(batch.batch_number.clone())),
            BatchStatus::Cancelled => Err(AppError::InvalidStateTransition(format!(
                "Batch {} is cancelled",
                batch.batch_number
            ))),
        }
    }

    /// Re-sum item amounts and persist the recomputed totals, inside the
    /// caller's transaction
    async fn recalculate_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        batch: &Batch,
    ) -> AppResult<()> {
        let landed_amounts: Vec<Decimal> = sqlx::query_scalar(
            "SELECT amount_in_batch_currency FROM landed_cost_items WHERE batch_id = $1",
        )
        .bind(batch.id)
        .fetch_all(&mut **tx)
        .await?;

        let totals = compute_batch_totals(
            batch.quantity_received,
            batch.unit_purchase_cost,
            &landed_amounts,
        );

        sqlx::query(
            r#"
            UPDATE batches
            SET total_purchase_cost = $1, total_landed_cost = $2, total_cost = $3,
                cost_per_unit = $4, updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(totals.total_purchase_cost)
        .bind(totals.total_landed_cost)
        .bind(totals.total_cost)
        .bind(totals.cost_per_unit)
        .bind(batch.id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
