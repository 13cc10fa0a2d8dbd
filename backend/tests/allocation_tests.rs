//! Allocation engine tests
//!
//! Tests for cost-flow allocation planning:
//! - FIFO/LIFO lot ordering
//! - Weighted average cost basis
//! - Specific lot selection
//! - All-or-nothing planning with exact shortfalls

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::allocation::{plan_allocation, weighted_average_cost, AllocationError, AvailableLot};
use shared::models::{CostMethod, SpecificAllocation};
use std::str::FromStr;
use uuid::Uuid;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// Helper to create a lot received on a given day of January 2024
fn lot(day: u32, available: &str, cost: &str) -> AvailableLot {
    AvailableLot {
        batch_id: Uuid::new_v4(),
        received_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        batch_created_at: Utc.with_ymd_and_hms(2024, 1, day, 8, 0, 0).unwrap(),
        available: dec(available),
        cost_per_unit: dec(cost),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// FIFO drains the oldest lot before touching newer ones
    #[test]
    fn test_fifo_ordering() {
        let old = lot(1, "10", "2.00");
        let new = lot(15, "10", "3.00");
        let lots = vec![new.clone(), old.clone()];

        let plan = plan_allocation(&lots, dec("12"), CostMethod::Fifo, None).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].batch_id, old.batch_id);
        assert_eq!(plan[0].quantity, dec("10"));
        assert_eq!(plan[1].batch_id, new.batch_id);
        assert_eq!(plan[1].quantity, dec("2"));
    }

    /// LIFO drains the newest lot first
    #[test]
    fn test_lifo_ordering() {
        let old = lot(1, "10", "2.00");
        let new = lot(15, "10", "3.00");
        let lots = vec![old.clone(), new.clone()];

        let plan = plan_allocation(&lots, dec("12"), CostMethod::Lifo, None).unwrap();

        assert_eq!(plan[0].batch_id, new.batch_id);
        assert_eq!(plan[0].quantity, dec("10"));
        assert_eq!(plan[1].batch_id, old.batch_id);
        assert_eq!(plan[1].quantity, dec("2"));
    }

    /// FIFO plan line costs come from each consumed lot
    #[test]
    fn test_fifo_cost_basis() {
        let lots = vec![lot(1, "10", "2.00"), lot(2, "5", "3.00")];

        let plan = plan_allocation(&lots, dec("12"), CostMethod::Fifo, None).unwrap();

        // 10 @ 2.00 = 20.00, then 2 @ 3.00 = 6.00
        assert_eq!(plan[0].cost_per_unit, dec("2.00"));
        assert_eq!(plan[0].total_cost, dec("20.00"));
        assert_eq!(plan[1].cost_per_unit, dec("3.00"));
        assert_eq!(plan[1].total_cost, dec("6.00"));
    }

    /// Weighted average stamps every line with the same cost basis
    #[test]
    fn test_weighted_avg_uniform_cost() {
        // (10*2.00 + 5*3.00) / 15 = 2.3333
        let lots = vec![lot(1, "10", "2.00"), lot(2, "5", "3.00")];

        let plan = plan_allocation(&lots, dec("12"), CostMethod::WeightedAvg, None).unwrap();

        for line in &plan {
            assert_eq!(line.cost_per_unit, dec("2.3333"));
        }
        assert_eq!(plan[0].total_cost, dec("23.33"));
    }

    /// Weighted average of empty stock is zero
    #[test]
    fn test_weighted_avg_empty_stock() {
        assert_eq!(weighted_average_cost(&[]), Decimal::ZERO);
        assert_eq!(weighted_average_cost(&[lot(1, "0", "9.00")]), Decimal::ZERO);
    }

    /// A demand that exceeds total availability fails with the exact shortfall
    #[test]
    fn test_shortfall_reporting() {
        let lots = vec![lot(1, "10", "2.00"), lot(2, "5", "3.00")];

        let err = plan_allocation(&lots, dec("20"), CostMethod::Fifo, None).unwrap_err();

        assert_eq!(
            err,
            AllocationError::InsufficientAvailable {
                demand: dec("20"),
                shortfall: dec("5"),
            }
        );
    }

    /// Specific allocation takes exactly the named quantities from the named lots
    #[test]
    fn test_specific_allocation() {
        let a = lot(1, "10", "2.00");
        let b = lot(2, "5", "3.00");
        let lots = vec![a.clone(), b.clone()];
        let pairs = vec![
            SpecificAllocation { batch_id: b.batch_id, quantity: dec("4") },
            SpecificAllocation { batch_id: a.batch_id, quantity: dec("3") },
        ];

        let plan = plan_allocation(&lots, dec("7"), CostMethod::Specific, Some(&pairs)).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].batch_id, b.batch_id);
        assert_eq!(plan[0].quantity, dec("4"));
        assert_eq!(plan[1].batch_id, a.batch_id);
        assert_eq!(plan[1].total_cost, dec("6.00"));
    }

    /// Specific allocation rejects a batch with too little availability
    #[test]
    fn test_specific_over_allocation() {
        let a = lot(1, "3", "2.00");
        let lots = vec![a.clone()];
        let pairs = vec![SpecificAllocation { batch_id: a.batch_id, quantity: dec("4") }];

        let err =
            plan_allocation(&lots, dec("4"), CostMethod::Specific, Some(&pairs)).unwrap_err();

        assert_eq!(
            err,
            AllocationError::InsufficientInBatch {
                batch_id: a.batch_id,
                available: dec("3"),
                requested: dec("4"),
            }
        );
    }

    /// Specific method without pairs is a validation failure
    #[test]
    fn test_specific_requires_pairs() {
        let lots = vec![lot(1, "3", "2.00")];

        let err = plan_allocation(&lots, dec("1"), CostMethod::Specific, None).unwrap_err();
        assert_eq!(err, AllocationError::MissingSpecificAllocations);

        let err =
            plan_allocation(&lots, dec("1"), CostMethod::Specific, Some(&[])).unwrap_err();
        assert_eq!(err, AllocationError::MissingSpecificAllocations);
    }

    /// Zero and negative demand are rejected up front
    #[test]
    fn test_non_positive_demand() {
        let lots = vec![lot(1, "3", "2.00")];

        for demand in [Decimal::ZERO, dec("-1")] {
            let err = plan_allocation(&lots, demand, CostMethod::Fifo, None).unwrap_err();
            assert_eq!(err, AllocationError::NonPositiveDemand);
        }
    }

    /// Cost method strings round-trip through parse
    #[test]
    fn test_cost_method_parse() {
        for method in [
            CostMethod::Fifo,
            CostMethod::Lifo,
            CostMethod::Specific,
            CostMethod::WeightedAvg,
        ] {
            assert_eq!(CostMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(CostMethod::parse("average"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating available quantities (0.1 to 1000.0)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1))
    }

    /// Strategy for generating unit costs (0.01 to 1000.00)
    fn cost_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Strategy for generating a shelf of lots on distinct days
    fn lots_strategy() -> impl Strategy<Value = Vec<AvailableLot>> {
        prop::collection::vec((quantity_strategy(), cost_strategy()), 1..8).prop_map(|pairs| {
            pairs
                .into_iter()
                .enumerate()
                .map(|(i, (available, cost))| AvailableLot {
                    batch_id: Uuid::new_v4(),
                    received_date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                    batch_created_at: Utc
                        .with_ymd_and_hms(2024, 1, (i + 1) as u32, 8, 0, 0)
                        .unwrap(),
                    available,
                    cost_per_unit: cost,
                })
                .collect()
        })
    }

    /// Strategy for a cost method that needs no specific pairs
    fn method_strategy() -> impl Strategy<Value = CostMethod> {
        prop_oneof![
            Just(CostMethod::Fifo),
            Just(CostMethod::Lifo),
            Just(CostMethod::WeightedAvg),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Plan quantities always sum exactly to the demand
        #[test]
        fn prop_plan_covers_demand_exactly(
            lots in lots_strategy(),
            method in method_strategy(),
            fraction in 1u32..=100u32,
        ) {
            let total: Decimal = lots.iter().map(|l| l.available).sum();
            let demand = (total * Decimal::from(fraction) / Decimal::from(100u32))
                .round_dp(1);
            if demand <= Decimal::ZERO {
                return Ok(());
            }

            let plan = plan_allocation(&lots, demand, method, None).unwrap();
            let planned: Decimal = plan.iter().map(|r| r.quantity).sum();

            prop_assert_eq!(planned, demand);
        }

        /// No plan line exceeds the availability of its lot
        #[test]
        fn prop_no_line_exceeds_lot(
            lots in lots_strategy(),
            method in method_strategy(),
        ) {
            let total: Decimal = lots.iter().map(|l| l.available).sum();
            let plan = plan_allocation(&lots, total, method, None).unwrap();

            for line in &plan {
                let lot = lots.iter().find(|l| l.batch_id == line.batch_id).unwrap();
                prop_assert!(line.quantity > Decimal::ZERO);
                prop_assert!(line.quantity <= lot.available);
            }
        }

        /// Each lot appears at most once in a plan
        #[test]
        fn prop_lots_consumed_at_most_once(
            lots in lots_strategy(),
            method in method_strategy(),
        ) {
            let total: Decimal = lots.iter().map(|l| l.available).sum();
            let plan = plan_allocation(&lots, total, method, None).unwrap();

            let mut seen = std::collections::HashSet::new();
            for line in &plan {
                prop_assert!(seen.insert(line.batch_id));
            }
        }

        /// Over-demand always fails, and the shortfall is exact
        #[test]
        fn prop_over_demand_reports_exact_shortfall(
            lots in lots_strategy(),
            method in method_strategy(),
            excess in quantity_strategy(),
        ) {
            let total: Decimal = lots.iter().map(|l| l.available).sum();
            let demand = total + excess;

            let err = plan_allocation(&lots, demand, method, None).unwrap_err();

            prop_assert_eq!(
                err,
                AllocationError::InsufficientAvailable { demand, shortfall: excess }
            );
        }

        /// Weighted average cost lies between the cheapest and dearest lot
        #[test]
        fn prop_weighted_avg_bounded(lots in lots_strategy()) {
            let avg = weighted_average_cost(&lots);
            let min = lots.iter().map(|l| l.cost_per_unit).min().unwrap();
            let max = lots.iter().map(|l| l.cost_per_unit).max().unwrap();

            prop_assert!(avg >= min);
            prop_assert!(avg <= max);
        }

        /// FIFO and LIFO plans value the same demand at opposite ends:
        /// with costs increasing by received date, FIFO never costs more
        #[test]
        fn prop_fifo_cheaper_when_costs_rise(
            quantities in prop::collection::vec(quantity_strategy(), 2..6),
            fraction in 1u32..=100u32,
        ) {
            // Costs strictly increase with age rank
            let lots: Vec<AvailableLot> = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| AvailableLot {
                    batch_id: Uuid::new_v4(),
                    received_date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                    batch_created_at: Utc
                        .with_ymd_and_hms(2024, 1, (i + 1) as u32, 8, 0, 0)
                        .unwrap(),
                    available: *q,
                    cost_per_unit: Decimal::from((i + 1) as u32),
                })
                .collect();

            let total: Decimal = lots.iter().map(|l| l.available).sum();
            let demand = (total * Decimal::from(fraction) / Decimal::from(100u32)).round_dp(1);
            if demand <= Decimal::ZERO {
                return Ok(());
            }

            let fifo = plan_allocation(&lots, demand, CostMethod::Fifo, None).unwrap();
            let lifo = plan_allocation(&lots, demand, CostMethod::Lifo, None).unwrap();

            let fifo_value: Decimal = fifo.iter().map(|r| r.total_cost).sum();
            let lifo_value: Decimal = lifo.iter().map(|r| r.total_cost).sum();

            prop_assert!(fifo_value <= lifo_value);
        }

        /// Planning never mutates the lot snapshot
        #[test]
        fn prop_planning_is_pure(lots in lots_strategy(), method in method_strategy()) {
            let before: Vec<Decimal> = lots.iter().map(|l| l.available).collect();
            let total: Decimal = lots.iter().map(|l| l.available).sum();

            let _ = plan_allocation(&lots, total, method, None);

            let after: Vec<Decimal> = lots.iter().map(|l| l.available).collect();
            prop_assert_eq!(before, after);
        }
    }
}
