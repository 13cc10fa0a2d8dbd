//! Inventory ledger models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cost-flow assumption used when allocating stock out of batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostMethod {
    Fifo,
    Lifo,
    Specific,
    WeightedAvg,
}

impl CostMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostMethod::Fifo => "fifo",
            CostMethod::Lifo => "lifo",
            CostMethod::Specific => "specific",
            CostMethod::WeightedAvg => "weighted_avg",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fifo" => Some(CostMethod::Fifo),
            "lifo" => Some(CostMethod::Lifo),
            "specific" => Some(CostMethod::Specific),
            "weighted_avg" => Some(CostMethod::WeightedAvg),
            _ => None,
        }
    }
}

/// One ledger row, uniquely keyed by (product, batch, warehouse)
///
/// Invariant: `0 <= reserved_quantity <= quantity` at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub id: Uuid,
    pub product_id: Uuid,
    pub batch_id: Uuid,
    pub warehouse_id: Uuid,
    /// On-hand quantity
    pub quantity: Decimal,
    /// Quantity committed to open demand
    pub reserved_quantity: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryLevel {
    /// On-hand minus reserved
    pub fn available_quantity(&self) -> Decimal {
        self.quantity - self.reserved_quantity
    }
}

/// One line of an allocation plan: quantity drawn from a batch at a cost basis
///
/// Transient: produced by the allocation engine, consumed by the
/// reservation/fulfillment operations, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub batch_id: Uuid,
    pub quantity: Decimal,
    pub cost_per_unit: Decimal,
    /// quantity * cost_per_unit
    pub total_cost: Decimal,
}

/// Explicit (batch, quantity) pair for specific-lot allocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecificAllocation {
    pub batch_id: Uuid,
    pub quantity: Decimal,
}

/// Aggregated stock position for a product across batches and warehouses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInventorySummary {
    pub product_id: Uuid,
    pub total_quantity: Decimal,
    pub total_reserved: Decimal,
    pub available_quantity: Decimal,
    /// Sum of on-hand quantity valued at each batch's cost per unit, 2 dp
    pub total_value: Decimal,
    /// Value-weighted average cost per unit, 4 dp (0 when no stock)
    pub avg_cost_per_unit: Decimal,
}
