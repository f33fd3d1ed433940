//! # Error Types
//!
//! Domain-specific error types for dokan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dokan-core errors (this file)                                         │
//! │  ├── CoreError        - Ledger rejections                              │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── SnapshotError    - Malformed export/import data                   │
//! │                                                                         │
//! │  dokan-db errors (separate crate)                                      │
//! │  └── DbError          - Local record failures                          │
//! │                                                                         │
//! │  dokan-sync errors (separate crate)                                    │
//! │  └── SyncError        - Remote document / coordinator failures         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `CoreError` is a rejection value: the operation that returned it left the
//! `AppState` exactly as it found it.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger rejections.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Product id does not exist in the catalog.
    ///
    /// ## When This Occurs
    /// - Checkout line references a deleted product
    /// - Purchase recorded against a deleted product
    /// - Edit of a product removed on another device and synced down
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Insufficient stock to complete a checkout.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (Napa ×5, Sergel ×2)
    ///      │
    ///      ▼
    /// Check every line: Napa available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Napa", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Nothing applied - no sales, no stock change
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// No sales share the given transaction timestamp.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(i64),

    /// Credit account id does not exist.
    #[error("Credit account not found: {0}")]
    CreditNotFound(String),

    /// A credit account with this phone number already exists.
    #[error("Customer with phone {phone} already exists")]
    DuplicateCustomer { phone: String },

    /// Checkout was called with no lines.
    #[error("Checkout has no items")]
    EmptyCheckout,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value would overflow the stored integer.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Invalid format (e.g., phone number with letters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn positive(field: &str) -> Self {
        ValidationError::MustBePositive {
            field: field.to_string(),
        }
    }

    pub(crate) fn non_negative(field: &str) -> Self {
        ValidationError::MustNotBeNegative {
            field: field.to_string(),
        }
    }

    pub(crate) fn too_large(field: &str) -> Self {
        ValidationError::TooLarge {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Snapshot Error
// =============================================================================

/// Errors from exporting or importing a full snapshot.
///
/// Import failures never touch the current state; the caller shows the
/// message and keeps going.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Payload is not valid JSON or does not fit the snapshot shape.
    #[error("Snapshot is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// JSON parsed but lacks a collection every backup must carry.
    #[error("Snapshot is missing required key '{0}'")]
    MissingKey(&'static str),

    /// Top-level value is not a JSON object.
    #[error("Snapshot must be a JSON object")]
    NotAnObject,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
