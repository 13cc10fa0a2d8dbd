//! Batch costing tests
//!
//! Tests for batch landed cost computation:
//! - Currency conversion of landed cost items
//! - Total and per-unit cost recomputation
//! - Draft/confirmed/cancelled lifecycle rules
//! - Document number formatting

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::costing::{
    amount_in_batch_currency, compute_batch_totals, round_money, round_unit_cost, unit_cost,
};
use shared::models::BatchStatus;
use shared::validation::{
    validate_currency_code, validate_document_prefix, validate_exchange_rate,
    validate_positive_quantity,
};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// A landed cost in the batch currency converts at rate 1
    #[test]
    fn test_conversion_identity_rate() {
        assert_eq!(amount_in_batch_currency(dec("125.5"), Decimal::ONE), dec("125.50"));
    }

    /// Foreign-currency landed costs convert and round to 2 dp
    #[test]
    fn test_conversion_rounds_to_money() {
        // 99.99 * 0.8734 = 87.331266 -> 87.33
        assert_eq!(amount_in_batch_currency(dec("99.99"), dec("0.8734")), dec("87.33"));
    }

    /// Batch totals combine the purchase line and landed items
    #[test]
    fn test_batch_totals() {
        // 100 @ 2.50 purchase, 30.00 freight + 12.55 duty
        let totals = compute_batch_totals(dec("100"), dec("2.50"), &[dec("30.00"), dec("12.55")]);

        assert_eq!(totals.total_purchase_cost, dec("250.00"));
        assert_eq!(totals.total_landed_cost, dec("42.55"));
        assert_eq!(totals.total_cost, dec("292.55"));
        assert_eq!(totals.cost_per_unit, dec("2.9255"));
    }

    /// A batch with no landed items costs exactly its purchase line
    #[test]
    fn test_totals_without_landed_items() {
        let totals = compute_batch_totals(dec("40"), dec("3.75"), &[]);

        assert_eq!(totals.total_landed_cost, dec("0.00"));
        assert_eq!(totals.total_cost, dec("150.00"));
        assert_eq!(totals.cost_per_unit, dec("3.7500"));
    }

    /// Unit cost carries 4 decimal places
    #[test]
    fn test_unit_cost_precision() {
        // 100 / 3 = 33.3333...
        assert_eq!(unit_cost(dec("100"), dec("3")), dec("33.3333"));
    }

    /// Zero-quantity batches report a zero unit cost instead of dividing
    #[test]
    fn test_unit_cost_zero_quantity() {
        assert_eq!(unit_cost(dec("500.00"), Decimal::ZERO), Decimal::ZERO);
    }

    /// Batch status strings round-trip through parse
    #[test]
    fn test_batch_status_parse() {
        for status in [BatchStatus::Draft, BatchStatus::Confirmed, BatchStatus::Cancelled] {
            assert_eq!(BatchStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BatchStatus::parse("archived"), None);
    }

    /// Only draft batches accept cost mutations; confirmed and cancelled do not
    #[test]
    fn test_cost_mutation_gate() {
        let mutable = |s: BatchStatus| s == BatchStatus::Draft;

        assert!(mutable(BatchStatus::Draft));
        assert!(!mutable(BatchStatus::Confirmed));
        assert!(!mutable(BatchStatus::Cancelled));
    }

    /// Validation of landed cost item inputs
    #[test]
    fn test_landed_cost_item_validation() {
        assert!(validate_positive_quantity(dec("0.01")).is_ok());
        assert!(validate_positive_quantity(Decimal::ZERO).is_err());
        assert!(validate_exchange_rate(dec("0.8734")).is_ok());
        assert!(validate_exchange_rate(dec("-1")).is_err());
        assert!(validate_currency_code("THB").is_ok());
        assert!(validate_currency_code("baht").is_err());
    }

    /// Document numbers follow PREFIX-YYYYMMDD-NNNN
    #[test]
    fn test_document_number_format() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        let number = format!("{}-{}-{:04}", "BAT", date.format("%Y%m%d"), 1);

        assert_eq!(number, "BAT-20240117-0001");
        assert!(validate_document_prefix("BAT").is_ok());
    }

    /// Sequence numbers widen past four digits instead of truncating
    #[test]
    fn test_document_number_widens() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        let number = format!("{}-{}-{:04}", "BAT", date.format("%Y%m%d"), 10234);

        assert_eq!(number, "BAT-20240117-10234");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating quantities (0.1 to 1000.0)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1))
    }

    /// Strategy for generating unit costs and amounts (0.01 to 1000.00)
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Strategy for generating exchange rates (0.0001 to 10.0000)
    fn rate_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 4))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Total cost is always the purchase line plus the landed items
        #[test]
        fn prop_total_is_purchase_plus_landed(
            quantity in quantity_strategy(),
            unit_price in amount_strategy(),
            landed in prop::collection::vec(amount_strategy(), 0..8),
        ) {
            let totals = compute_batch_totals(quantity, unit_price, &landed);

            prop_assert_eq!(
                totals.total_cost,
                totals.total_purchase_cost + totals.total_landed_cost
            );
        }

        /// Adding a landed item never lowers the total cost
        #[test]
        fn prop_landed_items_monotonic(
            quantity in quantity_strategy(),
            unit_price in amount_strategy(),
            landed in prop::collection::vec(amount_strategy(), 0..6),
            extra in amount_strategy(),
        ) {
            let before = compute_batch_totals(quantity, unit_price, &landed);

            let mut with_extra = landed.clone();
            with_extra.push(extra);
            let after = compute_batch_totals(quantity, unit_price, &with_extra);

            prop_assert!(after.total_cost >= before.total_cost);
        }

        /// Recomputation from the same inputs is idempotent
        #[test]
        fn prop_recomputation_idempotent(
            quantity in quantity_strategy(),
            unit_price in amount_strategy(),
            landed in prop::collection::vec(amount_strategy(), 0..8),
        ) {
            let first = compute_batch_totals(quantity, unit_price, &landed);
            let second = compute_batch_totals(quantity, unit_price, &landed);

            prop_assert_eq!(first, second);
        }

        /// Currency conversion always lands on 2 decimal places
        #[test]
        fn prop_conversion_scale(
            amount in amount_strategy(),
            rate in rate_strategy(),
        ) {
            let converted = amount_in_batch_currency(amount, rate);

            prop_assert_eq!(converted, round_money(converted));
            prop_assert!(converted >= Decimal::ZERO);
        }

        /// Unit cost times quantity recovers the total within rounding
        #[test]
        fn prop_unit_cost_recovers_total(
            quantity in quantity_strategy(),
            unit_price in amount_strategy(),
        ) {
            let totals = compute_batch_totals(quantity, unit_price, &[]);
            let recovered = round_money(totals.cost_per_unit * quantity);

            // 4 dp per-unit rounding drifts at most 0.00005 per unit, plus
            // a final cent rounding
            let error = (recovered - totals.total_cost).abs();
            prop_assert!(error <= dec("0.06"), "error {} too large", error);
        }

        /// Rounding helpers are idempotent
        #[test]
        fn prop_rounding_idempotent(amount in amount_strategy()) {
            prop_assert_eq!(round_money(round_money(amount)), round_money(amount));
            prop_assert_eq!(
                round_unit_cost(round_unit_cost(amount)),
                round_unit_cost(amount)
            );
        }
    }
}
