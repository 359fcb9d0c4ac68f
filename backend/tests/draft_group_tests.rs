//! Draft group approval tests
//!
//! Covers the pre-check pass of atomic group approval:
//! - demand aggregation per (article, batch) key
//! - deterministic ascending lock order
//! - shortage demand charged to stock before weigh-in demand

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use paintrack_backend::error::AppError;
use paintrack_backend::services::approval::{plan_shortage, plan_weigh_in};
use paintrack_backend::services::draft_group::{
    aggregate_needs, check_key_availability, KeyNeeds,
};
use shared::types::DraftType;

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
    fn test_lines_on_same_key_sum() {
        let lines = vec![
            (7, 3, DraftType::WeighIn, dec("1.25")),
            (7, 3, DraftType::WeighIn, dec("2.75")),
        ];
        let needs = aggregate_needs(&lines);
        assert_eq!(needs.len(), 1);
        assert_eq!(needs[&(7, 3)].weigh_in, dec("4.00"));
    }

    #[test]
    fn test_types_tracked_separately() {
        let lines = vec![
            (7, 3, DraftType::WeighIn, dec("4")),
            (7, 3, DraftType::InventoryShortage, dec("6")),
        ];
        let needs = aggregate_needs(&lines);
        assert_eq!(needs[&(7, 3)].weigh_in, dec("4"));
        assert_eq!(needs[&(7, 3)].shortage, dec("6"));
    }

    #[test]
    fn test_keys_iterate_ascending() {
        let lines = vec![
            (9, 1, DraftType::WeighIn, dec("1")),
            (2, 8, DraftType::WeighIn, dec("1")),
            (2, 3, DraftType::WeighIn, dec("1")),
            (9, 0, DraftType::WeighIn, dec("1")),
        ];
        let keys: Vec<_> = aggregate_needs(&lines).into_keys().collect();
        assert_eq!(keys, vec![(2, 3), (2, 8), (9, 0), (9, 1)]);
    }

    #[test]
    fn test_mixed_demand_passes_when_stock_covers_both() {
        let needs = KeyNeeds {
            weigh_in: dec("6"),
            shortage: dec("4"),
        };
        // shortage takes 4 of 10 stock; weigh-in takes 2 surplus + 4 stock
        check_key_availability(1, 2, needs, dec("10"), dec("2")).unwrap();
    }

    #[test]
    fn test_shortage_cannot_borrow_from_surplus() {
        let needs = KeyNeeds {
            weigh_in: Decimal::ZERO,
            shortage: dec("5"),
        };
        let err = check_key_availability(1, 2, needs, dec("4"), dec("50")).unwrap_err();
        match err {
            AppError::InsufficientStock {
                required,
                available_stock,
                available_surplus,
                ..
            } => {
                assert_eq!(required, dec("5"));
                assert_eq!(available_stock, dec("4"));
                assert_eq!(available_surplus, Decimal::ZERO);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }
    }

    #[test]
    fn test_weigh_in_sees_stock_left_after_shortage() {
        let needs = KeyNeeds {
            weigh_in: dec("5"),
            shortage: dec("6"),
        };
        // stock 10: shortage leaves 4; surplus 0.5 + 4 < 5
        let err = check_key_availability(1, 2, needs, dec("10"), dec("0.5")).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));

        // one more half-kilo of surplus and it fits exactly
        check_key_availability(1, 2, needs, dec("10"), dec("1")).unwrap();
    }

    #[test]
    fn test_empty_line_set_aggregates_to_nothing() {
        assert!(aggregate_needs(&[]).is_empty());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn qty_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn level_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=200_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn line_strategy() -> impl Strategy<Value = (i64, i64, DraftType, Decimal)> {
        (
            1i64..=4,
            1i64..=4,
            prop_oneof![Just(DraftType::WeighIn), Just(DraftType::InventoryShortage)],
            qty_strategy(),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Aggregation conserves the total demand
        #[test]
        fn aggregation_conserves_demand(lines in prop::collection::vec(line_strategy(), 0..12)) {
            let needs = aggregate_needs(&lines);

            let total_in: Decimal = lines.iter().map(|l| l.3).sum();
            let total_out: Decimal = needs.values().map(|n| n.weigh_in + n.shortage).sum();
            prop_assert_eq!(total_in, total_out);
        }

        /// A key's pre-check passes exactly when executing its shortage
        /// first and then its weigh-in demand would succeed
        #[test]
        fn precheck_matches_sequential_execution(
            weigh_in in qty_strategy(),
            shortage in qty_strategy(),
            stock in level_strategy(),
            surplus in level_strategy(),
        ) {
            let needs = KeyNeeds { weigh_in, shortage };
            let precheck = check_key_availability(1, 1, needs, stock, surplus).is_ok();

            let sequential = match plan_shortage(shortage, stock) {
                Ok(plan) => plan_weigh_in(weigh_in, surplus, stock - plan.use_stock).is_ok(),
                Err(_) => false,
            };

            prop_assert_eq!(precheck, sequential);
        }
    }
}
