//! Batch and landed cost models
//!
//! A batch is one received lot of a product and the unit of cost tracking.
//! Its cost fields are mutable only while the batch is in draft; once
//! confirmed the valuation is frozen.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Batch lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Draft,
    Confirmed,
    Cancelled,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Draft => "draft",
            BatchStatus::Confirmed => "confirmed",
            BatchStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(BatchStatus::Draft),
            "confirmed" => Some(BatchStatus::Confirmed),
            "cancelled" => Some(BatchStatus::Cancelled),
            _ => None,
        }
    }
}

/// A received lot of a product from a supplier into a warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub batch_number: String,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub supplier_name: Option<String>,
    pub quantity_received: Decimal,
    pub unit_purchase_cost: Decimal,
    pub currency: String,
    pub total_purchase_cost: Decimal,
    pub total_landed_cost: Decimal,
    /// total_purchase_cost + total_landed_cost
    pub total_cost: Decimal,
    /// total_cost / quantity_received, 4 decimal places (0 when quantity is 0)
    pub cost_per_unit: Decimal,
    pub status: BatchStatus,
    pub received_date: NaiveDate,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    pub fn is_draft(&self) -> bool {
        self.status == BatchStatus::Draft
    }
}

/// One itemized additional cost (freight, duty, handling) attached to a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandedCostItem {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub cost_type: String,
    /// Raw amount in the item's own currency
    pub amount: Decimal,
    pub currency: String,
    pub exchange_rate: Decimal,
    /// round(amount * exchange_rate, 2), in the batch currency
    pub amount_in_batch_currency: Decimal,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
