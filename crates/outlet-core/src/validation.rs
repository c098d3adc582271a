//! # Validation Module
//!
//! Business-rule checks applied before state changes.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Front ends (counter terminal, web storefront)                │
//! │  └── Field formats, immediate feedback                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Quantities, prices, batch dates                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Storage (CHECK / NOT NULL constraints)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_BATCH_QUANTITY, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates an item code: must not be blank.
///
/// ```rust
/// use outlet_core::validation::validate_item_code;
///
/// assert!(validate_item_code("ITEM001").is_ok());
/// assert!(validate_item_code("   ").is_err());
/// ```
pub fn validate_item_code(code: &str) -> ValidationResult<()> {
    if code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "item code".to_string(),
        });
    }
    Ok(())
}

/// Validates a requested quantity (cart line or allocation).
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
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

/// Quantity after adding `extra` to an existing `current`, validated.
pub fn merged_quantity(current: i64, extra: i64) -> ValidationResult<i64> {
    let total = current.checked_add(extra).ok_or(ValidationError::OutOfRange {
        field: "quantity".to_string(),
        min: 1,
        max: MAX_ITEM_QUANTITY,
    })?;
    validate_quantity(total)?;
    Ok(total)
}

/// Validates a unit price: zero is allowed (free items), negative is not.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Validates an incoming stock batch.
///
/// ## Rules
/// - Quantity must be between 0 and [`MAX_BATCH_QUANTITY`]
/// - Expiry date cannot be before purchase date
pub fn validate_batch(
    quantity: i64,
    purchase_date: NaiveDate,
    expiry_date: NaiveDate,
) -> ValidationResult<()> {
    if !(0..=MAX_BATCH_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "batch quantity".to_string(),
            min: 0,
            max: MAX_BATCH_QUANTITY,
        });
    }

    if expiry_date < purchase_date {
        return Err(ValidationError::Inconsistent {
            field: "expiry date".to_string(),
            reason: format!("{} is before purchase date {}", expiry_date, purchase_date),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
