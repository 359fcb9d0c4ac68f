//! Draft approval tests
//!
//! Covers the consumption planning that drives approval:
//! - surplus is always consumed before stock
//! - stock-only consumption for shortage drafts
//! - insufficient inventory reports both availabilities

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use paintrack_backend::error::AppError;
use paintrack_backend::services::approval::{plan_shortage, plan_weigh_in};

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
    fn test_surplus_covers_whole_draft() {
        let plan = plan_weigh_in(dec("5.0"), dec("8.0"), dec("0.0")).unwrap();
        assert_eq!(plan.use_surplus, dec("5.0"));
        assert_eq!(plan.use_stock, dec("0.0"));
    }

    #[test]
    fn test_split_between_surplus_and_stock() {
        let plan = plan_weigh_in(dec("10.0"), dec("3.5"), dec("6.5")).unwrap();
        assert_eq!(plan.use_surplus, dec("3.5"));
        assert_eq!(plan.use_stock, dec("6.5"));
    }

    #[test]
    fn test_stock_only_when_no_surplus() {
        let plan = plan_weigh_in(dec("4.0"), dec("0.0"), dec("4.0")).unwrap();
        assert_eq!(plan.use_surplus, dec("0.0"));
        assert_eq!(plan.use_stock, dec("4.0"));
    }

    #[test]
    fn test_insufficient_total_is_rejected() {
        let err = plan_weigh_in(dec("10.0"), dec("3.0"), dec("6.99")).unwrap_err();
        match err {
            AppError::InsufficientStock {
                required,
                available_stock,
                available_surplus,
                ..
            } => {
                assert_eq!(required, dec("10.0"));
                assert_eq!(available_stock, dec("6.99"));
                assert_eq!(available_surplus, dec("3.0"));
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }
    }

    #[test]
    fn test_shortage_ignores_surplus_entirely() {
        // stock alone must cover the shortage
        let err = plan_shortage(dec("10.0"), dec("9.99")).unwrap_err();
        match err {
            AppError::InsufficientStock {
                available_surplus, ..
            } => assert_eq!(available_surplus, Decimal::ZERO),
            other => panic!("expected InsufficientStock, got {:?}", other),
        }

        let plan = plan_shortage(dec("10.0"), dec("10.0")).unwrap();
        assert_eq!(plan.use_stock, dec("10.0"));
        assert_eq!(plan.use_surplus, Decimal::ZERO);
    }

    #[test]
    fn test_two_cent_quantities() {
        let plan = plan_weigh_in(dec("0.02"), dec("0.01"), dec("0.01")).unwrap();
        assert_eq!(plan.use_surplus, dec("0.01"));
        assert_eq!(plan.use_stock, dec("0.01"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Quantities between 0.01 and 9999.99 kg
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=999_999i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Bucket levels between 0 and 9999.99 kg
    fn level_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=999_999i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The plan always covers the full quantity
        #[test]
        fn plan_conserves_quantity(
            qty in quantity_strategy(),
            surplus in level_strategy(),
            stock in level_strategy(),
        ) {
            if let Ok(plan) = plan_weigh_in(qty, surplus, stock) {
                prop_assert_eq!(plan.use_surplus + plan.use_stock, qty);
            }
        }

        /// Surplus is consumed before any stock is touched
        #[test]
        fn surplus_consumed_first(
            qty in quantity_strategy(),
            surplus in level_strategy(),
            stock in level_strategy(),
        ) {
            if let Ok(plan) = plan_weigh_in(qty, surplus, stock) {
                prop_assert_eq!(plan.use_surplus, surplus.min(qty));
                if plan.use_stock > Decimal::ZERO {
                    // stock only used once surplus is exhausted
                    prop_assert_eq!(plan.use_surplus, surplus);
                }
            }
        }

        /// Success exactly when surplus + stock covers the quantity
        #[test]
        fn plan_succeeds_iff_covered(
            qty in quantity_strategy(),
            surplus in level_strategy(),
            stock in level_strategy(),
        ) {
            let covered = surplus + stock >= qty;
            prop_assert_eq!(plan_weigh_in(qty, surplus, stock).is_ok(), covered);
        }

        /// Neither bucket is overdrawn
        #[test]
        fn plan_never_overdraws(
            qty in quantity_strategy(),
            surplus in level_strategy(),
            stock in level_strategy(),
        ) {
            if let Ok(plan) = plan_weigh_in(qty, surplus, stock) {
                prop_assert!(plan.use_surplus <= surplus);
                prop_assert!(plan.use_stock <= stock);
            }
        }

        /// Shortage plans succeed exactly when stock alone covers them
        #[test]
        fn shortage_ignores_surplus(
            qty in quantity_strategy(),
            stock in level_strategy(),
        ) {
            prop_assert_eq!(plan_shortage(qty, stock).is_ok(), stock >= qty);
        }
    }
}
