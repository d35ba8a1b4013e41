//! # Error Types
//!
//! Domain-specific error types for farmapos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  farmapos-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  farmapos-db errors (separate crate)                                   │
//! │  └── DbError          - Storage failures, not-found, conflicts         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → UI                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, shortfall, session id)
//! 3. Errors are enum variants, never String
//! 4. A rejected operation performs no write: errors are raised before
//!    any ledger/record mutation

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested movement would drive stock below zero.
    ///
    /// ## When This Occurs
    /// - A salida/venta/transferencia asks for more units than are on hand
    /// - Stock is never silently floored at zero: the whole operation is
    ///   rejected and nothing is written
    ///
    /// ## User Workflow
    /// ```text
    /// Movement form (salida, qty: 25)
    ///      │
    ///      ▼
    /// Current stock: 20 → new stock would be -5
    ///      │
    ///      ▼
    /// InsufficientStock { available: 20, requested: 25 }
    ///      │
    ///      ▼
    /// UI shows: "Stock insuficiente: solo 20 disponibles"
    /// ```
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    /// A close was attempted on a session that is already closed.
    ///
    /// Closing is a one-shot action: `closing_amount` is set exactly once
    /// and never retroactively edited.
    #[error("Cash session {session_id} is already closed")]
    SessionClosed { session_id: String },

    /// An accumulation (sale) was attempted on a session that is not open.
    #[error("Cash session {session_id} is not open")]
    SessionNotOpen { session_id: String },

    /// Kardex CSV serialization failed.
    ///
    /// Writing to an in-memory buffer, so this only fires on malformed
    /// record shapes - treated as a bug, surfaced rather than swallowed.
    #[error("CSV export failed: {0}")]
    ExportFailed(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs - no write is
/// ever attempted for a request that fails validation.
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

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            available: 20,
            requested: 25,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock: available 20, requested 25"
        );
    }

    #[test]
    fn test_session_error_messages() {
        let err = CoreError::SessionClosed {
            session_id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Cash session abc is already closed");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "product_id".to_string(),
        };
        assert_eq!(err.to_string(), "product_id is required");

        let err = ValidationError::MustBeNonNegative {
            field: "opening_amount".to_string(),
        };
        assert_eq!(err.to_string(), "opening_amount must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "location_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
