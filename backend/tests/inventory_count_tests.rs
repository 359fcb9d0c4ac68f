//! Inventory count reconciliation tests
//!
//! Covers count classification:
//! - over adds the difference to surplus
//! - equal changes nothing
//! - under resets surplus and stages the deficit as a shortage

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use paintrack_backend::services::inventory_count::{
    classify_count, validate_counted_total, CountPlan,
};

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

    #[test]
    fn test_over_counts_add_surplus() {
        assert_eq!(
            classify_count(dec("15"), dec("10"), dec("2")),
            CountPlan::Over { delta: dec("3") }
        );
    }

    #[test]
    fn test_exact_count_is_a_no_op() {
        assert_eq!(
            classify_count(dec("12"), dec("10"), dec("2")),
            CountPlan::NoChange
        );
    }

    #[test]
    fn test_under_count_resets_surplus_and_stages_shortage() {
        assert_eq!(
            classify_count(dec("9"), dec("10"), dec("2")),
            CountPlan::Under {
                surplus_reset: Some(dec("2")),
                shortage: dec("3"),
            }
        );
    }

    #[test]
    fn test_under_count_with_empty_surplus() {
        assert_eq!(
            classify_count(dec("6"), dec("10"), dec("0")),
            CountPlan::Under {
                surplus_reset: None,
                shortage: dec("4"),
            }
        );
    }

    #[test]
    fn test_count_of_zero_stages_everything() {
        assert_eq!(
            classify_count(dec("0"), dec("7.5"), dec("2.5")),
            CountPlan::Under {
                surplus_reset: Some(dec("2.5")),
                shortage: dec("10.0"),
            }
        );
    }

    #[test]
    fn test_empty_books_and_positive_count() {
        assert_eq!(
            classify_count(dec("4"), dec("0"), dec("0")),
            CountPlan::Over { delta: dec("4") }
        );
    }

    #[test]
    fn test_negative_count_rejected_before_reconciliation() {
        // a negative count on an empty key must not stage a phantom shortage
        assert!(validate_counted_total(dec("-5")).is_err());
        assert_eq!(validate_counted_total(dec("0")).unwrap(), dec("0"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn level_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=999_999i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The three cases partition all inputs, keyed on counted vs total
        #[test]
        fn classification_follows_the_sign_of_the_delta(
            counted in level_strategy(),
            stock in level_strategy(),
            surplus in level_strategy(),
        ) {
            let total = stock + surplus;
            match classify_count(counted, stock, surplus) {
                CountPlan::Over { delta } => {
                    prop_assert!(counted > total);
                    prop_assert_eq!(delta, counted - total);
                }
                CountPlan::NoChange => prop_assert_eq!(counted, total),
                CountPlan::Under { shortage, surplus_reset } => {
                    prop_assert!(counted < total);
                    prop_assert_eq!(shortage, total - counted);
                    prop_assert_eq!(surplus_reset.is_some(), surplus > Decimal::ZERO);
                }
            }
        }

        /// After an under-count is fully applied (surplus reset, shortage
        /// approved), the books equal the counted total
        #[test]
        fn applying_an_under_count_converges_on_the_counted_total(
            counted in level_strategy(),
            stock in level_strategy(),
            surplus in level_strategy(),
        ) {
            if let CountPlan::Under { shortage, surplus_reset } =
                classify_count(counted, stock, surplus)
            {
                let surplus_after = surplus - surplus_reset.unwrap_or(Decimal::ZERO);
                let stock_after = stock - shortage + surplus_after;
                // shortage consumes stock only; whatever surplus remains is zero
                prop_assert_eq!(surplus_after, Decimal::ZERO);
                prop_assert_eq!(stock_after, counted);
            }
        }
    }
}
