//! # Validation Module
//!
//! Input validation utilities for PharmaDesk.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Operator side (BillDraft, PurchaseDraft)                     │
//! │  ├── THIS MODULE + line/payment rules                                  │
//! │  └── Errors shown before any network call                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: API handler (Rust)                                           │
//! │  ├── Type validation (serde deserialization, closed enums)             │
//! │  └── THIS MODULE again: the server never trusts the client             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (medicine name, bill id)                                   │
//! │  └── Guarded stock decrements                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pharmadesk_core::validation::{validate_item_name, validate_age};
//!
//! validate_item_name("Paracetamol 500mg").unwrap();
//! assert!(validate_age(200).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted name (medicine, patient, agency).
pub const MAX_NAME_LEN: usize = 200;

/// Longest accepted search term.
pub const MAX_QUERY_LEN: usize = 100;

/// Oldest accepted patient age.
pub const MAX_AGE: i64 = 150;

/// Most units on one bill line, sold, delivered or returned.
pub const MAX_ITEM_QUANTITY: i64 = 100_000;

/// Highest unit price or catalog price, in paise (₹10,00,000.00).
pub const MAX_PRICE_PAISE: i64 = 100_000_000;

/// Largest bill-level amount in paise (₹1,00,00,00,000.00). Covers
/// discounts, taxes, bill amounts and payments.
pub const MAX_AMOUNT_PAISE: i64 = 100_000_000_000;

/// Most units one medicine row can hold.
pub const MAX_STOCK: i64 = 10_000_000;

/// Most lines on one bill. Sale line ids append a two-digit line number.
pub const MAX_LINES_PER_BILL: usize = 99;

// =============================================================================
// String Validators
// =============================================================================

/// Fails with `Required` when `value` is blank.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

fn validate_name_field(field: &str, name: &str) -> ValidationResult<()> {
    validate_required(field, name)?;

    if name.trim().chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

/// Validates the item name of a bill line.
///
/// ## Rules
/// - Must not be blank
/// - At most 200 characters
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    validate_name_field("item_name", name)
}

/// Validates a catalog medicine name.
///
/// ```rust
/// use pharmadesk_core::validation::validate_medicine_name;
///
/// assert!(validate_medicine_name("Amoxicillin 250mg").is_ok());
/// assert!(validate_medicine_name("  ").is_err());
/// ```
pub fn validate_medicine_name(name: &str) -> ValidationResult<()> {
    validate_name_field("name", name)
}

/// Validates a patient name.
pub fn validate_patient_name(name: &str) -> ValidationResult<()> {
    validate_name_field("patient_name", name)
}

/// Validates a phone number.
///
/// ## Rules
/// - Digits, with optional spaces, hyphens and a leading `+`
/// - 7 to 15 digits in total
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();
    validate_required("phone", phone)?;

    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return Err(ValidationError::invalid_format(
            "phone",
            "must contain only digits, spaces and hyphens",
        ));
    }

    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(7..=15).contains(&digits) {
        return Err(ValidationError::invalid_format(
            "phone",
            "must have between 7 and 15 digits",
        ));
    }
    Ok(())
}

/// Validates a search term and returns it trimmed. Empty is allowed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a patient age in years.
pub fn validate_age(age: i64) -> ValidationResult<()> {
    if !(0..=MAX_AGE).contains(&age) {
        return Err(ValidationError::OutOfRange {
            field: "age".to_string(),
            min: 0,
            max: MAX_AGE,
        });
    }
    Ok(())
}

/// Validates a price. Zero is allowed, the ceiling is [`MAX_PRICE_PAISE`].
///
/// ```rust
/// use pharmadesk_core::money::Money;
/// use pharmadesk_core::validation::validate_price;
///
/// assert!(validate_price("mrp", Money::zero()).is_ok());
/// assert!(validate_price("mrp", Money::from_paise(-1)).is_err());
/// assert!(validate_price("mrp", Money::from_paise(i64::MAX)).is_err());
/// ```
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    if price.paise() > MAX_PRICE_PAISE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_PAISE,
        });
    }
    Ok(())
}

/// Validates a non-negative bill-level amount (discount, tax, payment).
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    if amount.paise() > MAX_AMOUNT_PAISE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_PAISE,
        });
    }
    Ok(())
}

/// Validates a signed bill discount. Negative is a surcharge.
pub fn validate_discount(discount: Money) -> ValidationResult<()> {
    if !(-MAX_AMOUNT_PAISE..=MAX_AMOUNT_PAISE).contains(&discount.paise()) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: -MAX_AMOUNT_PAISE,
            max: MAX_AMOUNT_PAISE,
        });
    }
    Ok(())
}

/// Validates the quantity of a bill line or a return.
///
/// ```text
/// ┌─────────────────────────────────────┐
/// │  qty <= 0                 → Err     │
/// │  1..=MAX_ITEM_QUANTITY    → Ok      │
/// │  qty > MAX_ITEM_QUANTITY  → Err     │
/// └─────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates an absolute stock level.
pub fn validate_stock_level(field: &str, stock: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Paracetamol").is_ok());
        assert!(validate_item_name("").is_err());
        assert!(validate_item_name(&"A".repeat(201)).is_err());
        assert!(validate_item_name(&"A".repeat(200)).is_ok());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+91 98765-43210").is_ok());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("98765abc10").is_err());
    }

    #[test]
    fn test_validate_age() {
        assert!(validate_age(0).is_ok());
        assert!(validate_age(150).is_ok());
        assert!(validate_age(-1).is_err());
        assert!(validate_age(151).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  ravi ").unwrap(), "ravi");
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(matches!(
            validate_quantity(i64::MAX / 2),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_price_ceiling() {
        assert!(validate_price("mrp", Money::from_paise(MAX_PRICE_PAISE)).is_ok());
        assert!(validate_price("mrp", Money::from_paise(MAX_PRICE_PAISE + 1)).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("discount", Money::zero()).is_ok());
        assert!(validate_amount("discount", Money::from_paise(MAX_AMOUNT_PAISE)).is_ok());
        assert!(validate_amount("discount", Money::from_paise(-1)).is_err());
        assert!(validate_amount("discount", Money::from_paise(i64::MAX)).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(Money::from_paise(-500)).is_ok());
        assert!(validate_discount(Money::from_paise(MAX_AMOUNT_PAISE)).is_ok());
        assert!(validate_discount(Money::from_paise(i64::MIN)).is_err());
        assert!(validate_discount(Money::from_paise(i64::MAX)).is_err());
    }

    #[test]
    fn test_validate_stock_level() {
        assert!(validate_stock_level("current_stock", 0).is_ok());
        assert!(validate_stock_level("current_stock", MAX_STOCK).is_ok());
        assert!(validate_stock_level("current_stock", -1).is_err());
        assert!(validate_stock_level("current_stock", MAX_STOCK + 1).is_err());
    }

    #[test]
    fn test_largest_bill_fits_in_paise() {
        // Every line at the ceilings, plus the largest tax.
        let lines = MAX_LINES_PER_BILL as i64 * MAX_ITEM_QUANTITY * MAX_PRICE_PAISE;
        assert!(lines.checked_add(MAX_AMOUNT_PAISE).is_some());
        assert!((MAX_STOCK as i128) * (MAX_PRICE_PAISE as i128) < i64::MAX as i128);
    }
}
