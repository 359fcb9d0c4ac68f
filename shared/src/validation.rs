//! Validation rules for the Paintrack warehouse platform
//!
//! Everything here runs before the engine takes any database lock, so a
//! rejected input never costs a rollback.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Smallest accepted draft/receipt quantity in kg
pub const QUANTITY_MIN: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01
/// Largest accepted draft/receipt quantity in kg
pub const QUANTITY_MAX: Decimal = Decimal::from_parts(999_999, 0, 0, false, 2); // 9999.99

/// Validation failure with enough structure for a precise error response
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at least {min}")]
    BelowMinimum { field: &'static str, min: Decimal },

    #[error("{field} must not exceed {max}")]
    AboveMaximum { field: &'static str, max: Decimal },

    #[error("Invalid batch code format: {value}. Must be 4-5 digits (Mankiewicz) or 9-12 digits (Akzo).")]
    InvalidBatchFormat { value: String },
}

/// Round a quantity to 2 decimal places, half-up
pub fn round_quantity(quantity: Decimal) -> Decimal {
    quantity.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Validate and round a draft/receipt quantity
///
/// Rounds half-up to 2 decimal places first, then checks the
/// 0.01..=9999.99 kg range on the rounded value.
pub fn validate_quantity(
    quantity: Decimal,
    field: &'static str,
) -> Result<Decimal, ValidationError> {
    let rounded = round_quantity(quantity);

    if rounded < QUANTITY_MIN {
        return Err(ValidationError::BelowMinimum {
            field,
            min: QUANTITY_MIN,
        });
    }
    if rounded > QUANTITY_MAX {
        return Err(ValidationError::AboveMaximum {
            field,
            max: QUANTITY_MAX,
        });
    }

    Ok(rounded)
}

/// Validate and round a goods-receipt quantity
///
/// Receipts carry no upper bound; the rounded value only has to be
/// positive.
pub fn validate_receipt_quantity(quantity: Decimal) -> Result<Decimal, ValidationError> {
    let rounded = round_quantity(quantity);

    if rounded < QUANTITY_MIN {
        return Err(ValidationError::BelowMinimum {
            field: "quantity_kg",
            min: QUANTITY_MIN,
        });
    }

    Ok(rounded)
}

/// Validate a manufacturer batch code
///
/// Accepted formats: 4-5 digits (Mankiewicz) or 9-12 digits (Akzo).
pub fn validate_batch_code(batch_code: &str) -> Result<(), ValidationError> {
    if batch_code.is_empty() {
        return Err(ValidationError::Required { field: "batch_code" });
    }

    let all_digits = batch_code.chars().all(|c| c.is_ascii_digit());
    let len = batch_code.len();
    let valid_length = (4..=5).contains(&len) || (9..=12).contains(&len);

    if !all_digits || !valid_length {
        return Err(ValidationError::InvalidBatchFormat {
            value: batch_code.to_string(),
        });
    }

    Ok(())
}

/// Validate a client event id (idempotency key) is present and non-empty
pub fn validate_client_event_id(
    client_event_id: Option<&str>,
) -> Result<String, ValidationError> {
    match client_event_id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ValidationError::Required {
            field: "client_event_id",
        }),
    }
}

/// Validate an order number is present and non-empty
pub fn validate_order_number(order_number: &str) -> Result<String, ValidationError> {
    let trimmed = order_number.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "order_number",
        });
    }
    Ok(trimmed.to_string())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn quantity_rounds_half_up() {
        assert_eq!(round_quantity(dec("1.005")), dec("1.01"));
        assert_eq!(round_quantity(dec("1.004")), dec("1.00"));
        assert_eq!(round_quantity(dec("-1.005")), dec("-1.01"));
    }

    #[test]
    fn quantity_range_enforced_after_rounding() {
        assert_eq!(validate_quantity(dec("0.005"), "quantity_kg"), Ok(dec("0.01")));
        assert!(validate_quantity(dec("0.004"), "quantity_kg").is_err());
        assert!(validate_quantity(dec("10000.00"), "quantity_kg").is_err());
        assert_eq!(
            validate_quantity(dec("9999.994"), "quantity_kg"),
            Ok(dec("9999.99"))
        );
    }

    #[test]
    fn receipt_quantity_has_no_ceiling() {
        assert_eq!(
            validate_receipt_quantity(dec("15000")),
            Ok(dec("15000.00"))
        );
        assert_eq!(
            validate_receipt_quantity(dec("1.005")),
            Ok(dec("1.01"))
        );
        assert!(validate_receipt_quantity(dec("0")).is_err());
        assert!(validate_receipt_quantity(dec("-2")).is_err());
    }

    #[test]
    fn batch_code_formats() {
        assert!(validate_batch_code("0044").is_ok());
        assert!(validate_batch_code("10455").is_ok());
        assert!(validate_batch_code("292456953").is_ok());
        assert!(validate_batch_code("292466211234").is_ok());

        assert!(validate_batch_code("").is_err());
        assert!(validate_batch_code("123").is_err());
        assert!(validate_batch_code("123456").is_err());
        assert!(validate_batch_code("1234567890123").is_err());
        assert!(validate_batch_code("12a4").is_err());
    }

    #[test]
    fn client_event_id_must_be_non_empty() {
        assert_eq!(
            validate_client_event_id(Some(" evt-1 ")),
            Ok("evt-1".to_string())
        );
        assert!(validate_client_event_id(Some("   ")).is_err());
        assert!(validate_client_event_id(None).is_err());
    }
}
