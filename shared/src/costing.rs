//! Pure batch cost math
//!
//! Monetary sums round to 2 decimal places; unit costs round to 4 so a small
//! landed cost spread over many units is not lost. Everything is
//! `rust_decimal::Decimal` — binary floating point never touches money.

use rust_decimal::Decimal;

/// Decimal places for monetary sums
pub const MONEY_DP: u32 = 2;

/// Decimal places for unit costs
pub const UNIT_COST_DP: u32 = 4;

/// Round a monetary amount to 2 decimal places
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(MONEY_DP)
}

/// Round a unit cost to 4 decimal places
pub fn round_unit_cost(cost: Decimal) -> Decimal {
    cost.round_dp(UNIT_COST_DP)
}

/// Convert a landed cost amount into the batch currency: round(amount * rate, 2)
pub fn amount_in_batch_currency(amount: Decimal, exchange_rate: Decimal) -> Decimal {
    round_money(amount * exchange_rate)
}

/// Cost per unit: total / quantity at 4 dp, or zero for an empty batch
pub fn unit_cost(total_cost: Decimal, quantity: Decimal) -> Decimal {
    if quantity.is_zero() {
        Decimal::ZERO
    } else {
        round_unit_cost(total_cost / quantity)
    }
}

/// Recomputed batch totals after a landed cost change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCostTotals {
    pub total_purchase_cost: Decimal,
    pub total_landed_cost: Decimal,
    pub total_cost: Decimal,
    pub cost_per_unit: Decimal,
}

/// Recompute batch totals from the purchase line and its landed cost items
///
/// `landed_amounts` are the items' `amount_in_batch_currency` values, already
/// converted and rounded at insert time.
pub fn compute_batch_totals(
    quantity_received: Decimal,
    unit_purchase_cost: Decimal,
    landed_amounts: &[Decimal],
) -> BatchCostTotals {
    let total_purchase_cost = round_money(quantity_received * unit_purchase_cost);
    let total_landed_cost = round_money(landed_amounts.iter().copied().sum());
    let total_cost = total_purchase_cost + total_landed_cost;
    BatchCostTotals {
        total_purchase_cost,
        total_landed_cost,
        total_cost,
        cost_per_unit: unit_cost(total_cost, quantity_received),
    }
}
