//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Malformed input (the "invalid input" class)    │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures                               │
//! │                                                                         │
//! │  backoffice errors (app)                                               │
//! │  ├── ServiceError     - CoreError | storage failure                    │
//! │  └── ApiError         - What callers see (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant names the entity and field that failed so a caller can
//! render an actionable message.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// All of these are recoverable at the caller: the operation that produced
/// them was aborted without persisting anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Unknown product, bill, user or category.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A unique value is already taken (SKU, email, category name, bill number).
    #[error("{field} '{value}' already exists")]
    Conflict { field: String, value: String },

    /// Requested quantity exceeds what is on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale request: 5 × "Cola 330ml"
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Cola 330ml", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Caller shows: "Insufficient stock for "Cola 330ml". Available: 3"
    /// ```
    #[error("Insufficient stock for \"{product}\" ({sku}): available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Product exists but is switched off for sale.
    #[error("Product \"{product}\" ({sku}) is inactive")]
    ProductInactive { product: String, sku: String },

    /// Cancellation requested for a bill that is already cancelled.
    #[error("Bill {bill_number} is already cancelled")]
    AlreadyCancelled { bill_number: String },

    /// Malformed or out-of-range input.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Conflict error.
    pub fn conflict(field: impl Into<String>, value: impl Into<String>) -> Self {
        CoreError::Conflict {
            field: field.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements and are
/// raised before any store access.
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

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A manual adjustment would take stock below zero.
    #[error("Stock for {sku} cannot go below zero: on hand {on_hand}, change {change}")]
    NegativeStock {
        sku: String,
        on_hand: i64,
        change: i64,
    },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
        }
    }

    pub fn must_not_be_negative(field: impl Into<String>) -> Self {
        ValidationError::MustNotBeNegative {
            field: field.into(),
        }
    }

    /// A derived amount no longer fits in a signed 64-bit value.
    pub fn too_large(field: impl Into<String>) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min: 0,
            max: i64::MAX,
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
