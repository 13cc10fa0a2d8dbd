//! Batch allocation planning
//!
//! Given a demand quantity and a snapshot of available lots, produce an
//! allocation plan under a selectable cost-flow assumption. Planning is pure:
//! it never mutates the ledger, and a plan is all-or-nothing — if the demand
//! cannot be fully covered, the whole plan fails with the exact shortfall.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::costing::{round_money, round_unit_cost};
use crate::models::{AllocationResult, CostMethod, SpecificAllocation};

/// Snapshot of one ledger row joined with its batch, as seen at planning time
#[derive(Debug, Clone)]
pub struct AvailableLot {
    pub batch_id: Uuid,
    pub received_date: NaiveDate,
    /// Tie-break for lots received on the same date
    pub batch_created_at: DateTime<Utc>,
    /// quantity - reserved_quantity at planning time
    pub available: Decimal,
    pub cost_per_unit: Decimal,
}

/// Planning failures, surfaced to the caller unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("Demand quantity must be positive")]
    NonPositiveDemand,

    #[error("Insufficient available inventory: requested {demand}, short by {shortfall}")]
    InsufficientAvailable { demand: Decimal, shortfall: Decimal },

    #[error("Batch {batch_id} has {available} available, {requested} requested")]
    InsufficientInBatch {
        batch_id: Uuid,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Batch {0} is not available for allocation")]
    UnknownBatch(Uuid),

    #[error("Specific allocations are required for the specific cost method")]
    MissingSpecificAllocations,
}

/// Plan an allocation of `demand` units across `lots` under `method`
///
/// `specific` is consulted only for [`CostMethod::Specific`], where the caller
/// is the allocator and each (batch, quantity) pair is validated against the
/// lot's availability.
pub fn plan_allocation(
    lots: &[AvailableLot],
    demand: Decimal,
    method: CostMethod,
    specific: Option<&[SpecificAllocation]>,
) -> Result<Vec<AllocationResult>, AllocationError> {
    if demand <= Decimal::ZERO {
        return Err(AllocationError::NonPositiveDemand);
    }

    match method {
        CostMethod::Fifo => consume_greedy(sorted_fifo(lots), demand, None),
        CostMethod::Lifo => consume_greedy(sorted_lifo(lots), demand, None),
        CostMethod::WeightedAvg => {
            let avg = weighted_average_cost(lots);
            // FIFO still decides which physical lots are drawn down; only the
            // reported cost basis is uniform.
            consume_greedy(sorted_fifo(lots), demand, Some(avg))
        }
        CostMethod::Specific => {
            let pairs = specific.ok_or(AllocationError::MissingSpecificAllocations)?;
            if pairs.is_empty() {
                return Err(AllocationError::MissingSpecificAllocations);
            }
            plan_specific(lots, pairs)
        }
    }
}

/// Quantity-weighted mean cost per unit across all available lots, 4 dp
///
/// Zero when there is no available stock.
pub fn weighted_average_cost(lots: &[AvailableLot]) -> Decimal {
    let mut total_qty = Decimal::ZERO;
    let mut total_value = Decimal::ZERO;
    for lot in lots.iter().filter(|l| l.available > Decimal::ZERO) {
        total_qty += lot.available;
        total_value += lot.available * lot.cost_per_unit;
    }
    if total_qty.is_zero() {
        Decimal::ZERO
    } else {
        round_unit_cost(total_value / total_qty)
    }
}

/// Oldest received first; same-day lots order by batch creation, then id
fn sorted_fifo(lots: &[AvailableLot]) -> Vec<&AvailableLot> {
    let mut ordered: Vec<&AvailableLot> = lots
        .iter()
        .filter(|l| l.available > Decimal::ZERO)
        .collect();
    ordered.sort_by(|a, b| {
        (a.received_date, a.batch_created_at, a.batch_id)
            .cmp(&(b.received_date, b.batch_created_at, b.batch_id))
    });
    ordered
}

/// Newest received first
fn sorted_lifo(lots: &[AvailableLot]) -> Vec<&AvailableLot> {
    let mut ordered = sorted_fifo(lots);
    ordered.reverse();
    ordered
}

/// Greedy consumption shared by FIFO/LIFO/weighted average
///
/// Walks lots in policy order, taking `min(remaining, available)` from each.
/// `cost_override` stamps every result with a uniform cost basis.
fn consume_greedy(
    ordered: Vec<&AvailableLot>,
    demand: Decimal,
    cost_override: Option<Decimal>,
) -> Result<Vec<AllocationResult>, AllocationError> {
    let mut remaining = demand;
    let mut plan = Vec::new();

    for lot in ordered {
        if remaining <= Decimal::ZERO {
            break;
        }
        let take = remaining.min(lot.available);
        let cost_per_unit = cost_override.unwrap_or(lot.cost_per_unit);
        plan.push(AllocationResult {
            batch_id: lot.batch_id,
            quantity: take,
            cost_per_unit,
            total_cost: round_money(take * cost_per_unit),
        });
        remaining -= take;
    }

    if remaining > Decimal::ZERO {
        return Err(AllocationError::InsufficientAvailable {
            demand,
            shortfall: remaining,
        });
    }
    Ok(plan)
}

/// Caller-directed allocation: validate each pair against its lot
fn plan_specific(
    lots: &[AvailableLot],
    pairs: &[SpecificAllocation],
) -> Result<Vec<AllocationResult>, AllocationError> {
    let mut plan = Vec::with_capacity(pairs.len());
    for pair in pairs {
        if pair.quantity <= Decimal::ZERO {
            return Err(AllocationError::NonPositiveDemand);
        }
        let lot = lots
            .iter()
            .find(|l| l.batch_id == pair.batch_id)
            .ok_or(AllocationError::UnknownBatch(pair.batch_id))?;
        if lot.available < pair.quantity {
            return Err(AllocationError::InsufficientInBatch {
                batch_id: pair.batch_id,
                available: lot.available,
                requested: pair.quantity,
            });
        }
        plan.push(AllocationResult {
            batch_id: pair.batch_id,
            quantity: pair.quantity,
            cost_per_unit: lot.cost_per_unit,
            total_cost: round_money(pair.quantity * lot.cost_per_unit),
        });
    }
    Ok(plan)
}
