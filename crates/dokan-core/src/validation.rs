//! # Validation Module
//!
//! Input checks run by every ledger operation before it touches state.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: External UI                                                  │
//! │  ├── Form checks (empty, numeric)                                      │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Ledger operation (Rust)                                      │
//! │  ├── THIS MODULE: shape and range checks                               │
//! │  └── Referential checks (product/credit exists, stock available)       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Mutation (only reached when every check passed)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use dokan_core::validation::{validate_name, validate_quantity};
//!
//! validate_name("Napa 500mg").unwrap();
//! validate_quantity(5).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest name accepted for products, customers and the shop.
pub const MAX_NAME_LENGTH: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product or customer name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, MAX_NAME_LENGTH)
}

/// Validates a required free-text field under the given label.
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::required(field));
    }

    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an optional phone number.
///
/// ## Rules
/// - Empty is allowed (walk-in customers have no phone)
/// - Otherwise digits, spaces, `+` and `-` only
///
/// ## Example
/// ```rust
/// use dokan_core::validation::validate_phone;
///
/// assert!(validate_phone("").is_ok());
/// assert!(validate_phone("+880 1711-000000").is_ok());
/// assert!(validate_phone("call me").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    let valid = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '+' || c == '-');

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "only digits, spaces, '+' and '-' are allowed".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line or batch quantity.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::positive("quantity"));
    }
    Ok(())
}

/// Validates an amount that may be zero but not negative
/// (tendered cash, discount, batch cost, opening balance).
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::non_negative(field));
    }
    Ok(())
}

/// Validates an amount that must be strictly positive (a due payment).
pub fn validate_positive(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::positive(field));
    }
    Ok(())
}

/// Validates catalog prices.
pub fn validate_prices(buy_price: Money, sell_price: Money) -> ValidationResult<()> {
    validate_non_negative("buyPrice", buy_price)?;
    validate_non_negative("sellPrice", sell_price)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Napa").is_ok());
        assert_eq!(
            validate_name("   "),
            Err(ValidationError::Required {
                field: "name".to_string()
            })
        );
        assert!(matches!(
            validate_name(&"x".repeat(201)),
            Err(ValidationError::TooLong { max: 200, .. })
        ));
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("01711000000").is_ok());
        assert!(validate_phone("  ").is_ok());
        assert!(validate_phone("01711abc").is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_non_negative("paid", Money::zero()).is_ok());
        assert!(validate_non_negative("paid", Money::from_minor(-1)).is_err());
        assert!(validate_positive("amount", Money::zero()).is_err());
        assert!(validate_prices(Money::from_minor(60), Money::from_minor(100)).is_ok());
        assert!(validate_prices(Money::from_minor(-60), Money::from_minor(100)).is_err());
    }
}
