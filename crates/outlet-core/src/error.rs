//! # Error Types
//!
//! Domain-specific error types for outlet-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  outlet-core errors (this file)                                        │
//! │  ├── SaleError        - Every failure a sale operation can return      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  outlet-db errors (separate crate)                                     │
//! │  └── DbError          - Converted to SaleError::Persistence            │
//! │                                                                         │
//! │  Flow: ValidationError → SaleError ← DbError                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! Every variant except `Persistence` is a pure logic failure: the session
//! and the ledger are left exactly as they were before the call. No variant
//! is fatal to the process.

use thiserror::Error;

use crate::types::{Channel, PoolKind};

// =============================================================================
// Sale Error
// =============================================================================

/// Errors returned by sessions, ledgers, and facades.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaleError {
    /// The catalog collaborator could not resolve an item code.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// A pool cannot cover a requested quantity.
    ///
    /// ## When This Occurs
    /// ```text
    /// allocate("ITEM001", 20)
    ///      │
    ///      ▼
    /// Σ current_quantity over available batches = 15
    ///      │
    ///      ▼
    /// InsufficientStock { code: "ITEM001", available: 15, requested: 20 }
    ///      (no batch modified)
    /// ```
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// The checkout state does not permit the operation.
    #[error("Cannot {operation} while checkout is {state}")]
    InvalidStateTransition {
        state: String,
        operation: String,
    },

    /// A channel tried to touch a pool it is not bound to.
    #[error("{channel} transactions cannot use the {pool} inventory pool")]
    InvalidChannelForInventory { channel: Channel, pool: PoolKind },

    /// Cash tendered breaks the channel's payment rule.
    #[error("Invalid payment for {channel} transaction: {reason}")]
    InvalidPayment { channel: Channel, reason: String },

    /// Payment was requested for a checkout with no lines.
    #[error("Cannot take payment: cart is empty")]
    EmptyCart,

    /// A facade operation was called before `start`.
    #[error("No active checkout session")]
    NoActiveSession,

    /// An external collaborator failed; the message is passed through as-is.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl SaleError {
    pub(crate) fn invalid_transition(state: impl ToString, operation: impl ToString) -> Self {
        SaleError::InvalidStateTransition {
            state: state.to_string(),
            operation: operation.to_string(),
        }
    }

    pub(crate) fn invalid_payment(channel: Channel, reason: impl Into<String>) -> Self {
        SaleError::InvalidPayment {
            channel,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Two related fields are inconsistent (e.g. expiry before purchase).
    #[error("{field} is inconsistent: {reason}")]
    Inconsistent { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with SaleError.
pub type SaleResult<T> = Result<T, SaleError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SaleError::InsufficientStock {
            code: "ITEM001".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for ITEM001: available 3, requested 5"
        );

        let err = SaleError::InvalidChannelForInventory {
            channel: Channel::Online,
            pool: PoolKind::Store,
        };
        assert_eq!(
            err.to_string(),
            "ONLINE transactions cannot use the STORE inventory pool"
        );
    }

    #[test]
    fn test_transition_error_message() {
        let err = SaleError::invalid_transition("PaymentPending", "add a line");
        assert_eq!(err.to_string(), "Cannot add a line while checkout is PaymentPending");
    }

    #[test]
    fn test_validation_converts_to_sale_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let sale_err: SaleError = validation_err.into();
        assert!(matches!(sale_err, SaleError::Validation(_)));
    }
}
