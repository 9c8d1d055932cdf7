//! # Error Types
//!
//! Domain-specific error types for pharmadesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pharmadesk-core errors (this file)                                    │
//! │  ├── CoreError        - Billing rule violations, submission outcome    │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pharmadesk-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError         - What the front end sees (serialized)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Front end              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Local vs Remote
//! `Validation`, `InsufficientStock` and `PaymentMismatch` are raised
//! locally before any network call. `Transport` and `Rejected` only come
//! back from `BillDraft::submit`, and in both cases the draft is kept.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Requested quantity exceeds the last known stock.
    ///
    /// ## When This Occurs
    /// - Adding a line for more units than the fetched snapshot shows
    /// - Server-side stock decrement on invoice acceptance finds a shortfall
    /// - Recording a supplier return larger than the shelf stock
    ///
    /// ## User Workflow
    /// ```text
    /// Select "Paracetamol" ──► snapshot: currentStock = 5
    ///      │
    ///      ▼
    /// Enter qty 6 ──► InsufficientStock { available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// Line is NOT added, draft unchanged
    /// ```
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    /// Split payment components do not add up to the payable amount.
    ///
    /// Never auto-corrected: the operator must fix the figures.
    #[error("Payment mismatch: expected {expected}, got {actual}")]
    PaymentMismatch { expected: Money, actual: Money },

    /// A bill has no lines.
    #[error("Bill must contain at least one line")]
    EmptyBill,

    /// Supplier bill is already paid; the transition is one-way.
    #[error("Bill {bill_id} is already paid")]
    BillAlreadyPaid { bill_id: String },

    /// The submission never reached a confirmed server answer.
    ///
    /// ## When This Occurs
    /// - Connection refused, DNS failure, timeout
    /// - Server answered 5xx
    /// - Response body could not be read
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The server answered and refused the submission.
    #[error("Rejected by server: {message}")]
    Rejected { message: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true when the error came from the network boundary.
    pub fn is_remote(&self) -> bool {
        matches!(self, CoreError::Transport { .. } | CoreError::Rejected { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., non-integer quantity, bad date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
