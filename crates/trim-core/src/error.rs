//! # Error Types
//!
//! Domain-specific error types for trim-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  trim-core errors (this file)                                           │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Malformed or missing input                      │
//! │                                                                         │
//! │  trim-db errors (separate crate)                                        │
//! │  └── DbError          - Storage failures                                │
//! │                                                                         │
//! │  trim-api errors                                                        │
//! │  └── ApiError         - What the dashboard sees (JSON + status)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity (service, booking, employee, contact, business)
    /// does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Not enough stock to settle an invoice.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout: 3 x Pomade
    ///      │
    ///      ▼
    /// Inventory record: quantity_in_stock = 2
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Pomade", requested: 3, available: 2 }
    ///      │
    ///      ▼
    /// No invoice written, stock untouched
    /// ```
    #[error("Insufficient stock for {product}. Requested: {requested}, Available: {available}")]
    InsufficientStock {
        product: String,
        requested: i64,
        available: i64,
    },

    /// Booking status change that the lifecycle does not allow.
    #[error("Booking {booking_id} is {current}, cannot move to {requested}")]
    InvalidBookingStatus {
        booking_id: String,
        current: String,
        requested: String,
    },

    /// An active booking already holds this employee at this instant.
    #[error("Employee {employee_id} is already booked at {at}")]
    SlotTaken { employee_id: String, at: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
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
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any persistence call so that a bad request never leaves
/// partial state behind.
#[derive(Debug, Error)]
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
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., same service name and price twice).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A supplied total disagrees with its line items.
    #[error("{field} is {supplied} but its items add up to {computed}")]
    Mismatch {
        field: String,
        supplied: i64,
        computed: i64,
    },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Duplicate { field, .. }
            | ValidationError::Mismatch { field, .. } => field,
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
