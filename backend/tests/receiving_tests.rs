//! Stock receiving tests
//!
//! Covers the validation gate that every receipt passes before any
//! database lock is taken: order number, quantity rounding and
//! positivity, and manufacturer batch code formats.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::validation::{
    round_quantity, validate_batch_code, validate_order_number, validate_receipt_quantity,
    ValidationError, QUANTITY_MIN,
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
    fn test_order_number_is_trimmed_and_required() {
        assert_eq!(
            validate_order_number("  PO-2026-0815 "),
            Ok("PO-2026-0815".to_string())
        );
        assert_eq!(
            validate_order_number("   "),
            Err(ValidationError::Required {
                field: "order_number"
            })
        );
    }

    #[test]
    fn test_quantity_rounds_before_the_positivity_check() {
        // 0.004 rounds down to zero and fails; 0.005 rounds up and passes
        assert!(validate_receipt_quantity(dec("0.004")).is_err());
        assert_eq!(validate_receipt_quantity(dec("0.005")), Ok(dec("0.01")));
        assert!(validate_receipt_quantity(dec("0")).is_err());
        assert!(validate_receipt_quantity(dec("-3")).is_err());
    }

    #[test]
    fn test_bulk_receipts_above_the_draft_cap_are_accepted() {
        // receipts are not drafts; a full pallet order has no 9999.99 ceiling
        assert_eq!(validate_receipt_quantity(dec("15000")), Ok(dec("15000")));
        assert_eq!(
            validate_receipt_quantity(dec("123456.789")),
            Ok(dec("123456.79"))
        );
    }

    #[test]
    fn test_mankiewicz_batch_codes() {
        assert!(validate_batch_code("0044").is_ok());
        assert!(validate_batch_code("10455").is_ok());
    }

    #[test]
    fn test_akzo_batch_codes() {
        assert!(validate_batch_code("292456953").is_ok());
        assert!(validate_batch_code("292466211234").is_ok());
    }

    #[test]
    fn test_batch_codes_outside_both_bands_rejected() {
        for code in ["123", "123456", "12345678", "1234567890123", "10a55", ""] {
            assert!(validate_batch_code(code).is_err(), "accepted {code:?}");
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// A validated receipt quantity is always positive, already rounded,
        /// and never capped
        #[test]
        fn validated_receipt_quantities_are_canonical(n in 0i64..=200_000_000i64) {
            let raw = Decimal::new(n, 3);
            match validate_receipt_quantity(raw) {
                Ok(qty) => {
                    prop_assert!(qty >= QUANTITY_MIN);
                    prop_assert_eq!(qty, round_quantity(raw));
                }
                Err(_) => prop_assert!(round_quantity(raw) < QUANTITY_MIN),
            }
        }

        /// Digit strings are accepted exactly in the 4-5 and 9-12 bands
        #[test]
        fn batch_code_length_bands(len in 1usize..=15) {
            let code = "7".repeat(len);
            let accepted = (4..=5).contains(&len) || (9..=12).contains(&len);
            prop_assert_eq!(validate_batch_code(&code).is_ok(), accepted);
        }
    }
}
