//! # Validation Module
//!
//! Input validation for movement requests and cash-session actions.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  └── Runs BEFORE any write is attempted                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── Partial unique index (single open session)                        │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use farmapos_core::validation::validate_entered_quantity;
//! use farmapos_core::types::MovementType;
//!
//! // salida requires a strictly positive entry
//! assert!(validate_entered_quantity(MovementType::Salida, 5).is_ok());
//! assert!(validate_entered_quantity(MovementType::Salida, 0).is_err());
//!
//! // ajuste accepts zero: "I counted none" is a valid count
//! assert!(validate_entered_quantity(MovementType::Ajuste, 0).is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::{MovementRequest, MovementType};
use crate::{MAX_MOVEMENT_QUANTITY, MAX_NOTES_LEN, MAX_REGISTER_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Movement Validators
// =============================================================================

/// Validates a full movement request before it reaches the engine.
///
/// ## Rules
/// - product and location ids are required
/// - entered quantity obeys [`validate_entered_quantity`]
/// - unit cost, when given, is non-negative
/// - notes bounded by [`MAX_NOTES_LEN`]
pub fn validate_movement_request(request: &MovementRequest) -> ValidationResult<()> {
    validate_id("product_id", &request.product_id)?;
    validate_id("location_id", &request.location_id)?;
    validate_entered_quantity(request.movement_type, request.entered_quantity)?;

    if let Some(cents) = request.unit_cost_cents {
        if cents < 0 {
            return Err(ValidationError::MustBeNonNegative {
                field: "unit_cost".to_string(),
            });
        }
    }

    if let Some(notes) = &request.notes {
        validate_notes(notes)?;
    }

    Ok(())
}

/// Validates the user-entered quantity for a movement type.
///
/// ## Rules
/// - `ajuste`: the entry is the COUNTED absolute stock - zero is a valid
///   count, negatives are not
/// - every other type: must be strictly positive
/// - all types: bounded by [`MAX_MOVEMENT_QUANTITY`]
pub fn validate_entered_quantity(
    movement_type: MovementType,
    entered_quantity: i64,
) -> ValidationResult<()> {
    match movement_type {
        MovementType::Ajuste => {
            if entered_quantity < 0 {
                return Err(ValidationError::MustBeNonNegative {
                    field: "quantity".to_string(),
                });
            }
        }
        _ => {
            if entered_quantity <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                });
            }
        }
    }

    if entered_quantity > MAX_MOVEMENT_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_MOVEMENT_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Session Validators
// =============================================================================

/// Validates a register name before opening a session.
pub fn validate_register_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "register_name".to_string(),
        });
    }

    if name.len() > MAX_REGISTER_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "register_name".to_string(),
            max: MAX_REGISTER_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an opening/closing drawer amount.
///
/// ## Rules
/// - Must be non-negative; zero is allowed (empty drawer)
pub fn validate_drawer_amount(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a sale amount accumulated into a session.
///
/// ## Rules
/// - Must be strictly positive; a zero sale never reaches the register
pub fn validate_sale_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "sale amount".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Shared Validators
// =============================================================================

/// Validates a non-empty identifier field.
fn validate_id(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates the free-form notes field.
pub fn validate_notes(notes: &str) -> ValidationResult<()> {
    if notes.len() > MAX_NOTES_LEN {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
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

    fn request(movement_type: MovementType, entered: i64) -> MovementRequest {
        MovementRequest {
            product_id: "p1".to_string(),
            location_id: "l1".to_string(),
            batch_number: None,
            movement_type,
            entered_quantity: entered,
            unit_cost_cents: None,
            expiry_date: None,
            notes: None,
            reference_id: None,
            reference_type: None,
            user_id: None,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(validate_movement_request(&request(MovementType::Entrada, 5)).is_ok());
    }

    #[test]
    fn test_missing_ids_rejected() {
        let mut r = request(MovementType::Entrada, 5);
        r.product_id = "".to_string();
        assert!(validate_movement_request(&r).is_err());

        let mut r = request(MovementType::Entrada, 5);
        r.location_id = "   ".to_string();
        assert!(validate_movement_request(&r).is_err());
    }

    #[test]
    fn test_entered_quantity_rules() {
        // Regular types: strictly positive
        assert!(validate_entered_quantity(MovementType::Venta, 1).is_ok());
        assert!(validate_entered_quantity(MovementType::Venta, 0).is_err());
        assert!(validate_entered_quantity(MovementType::Venta, -3).is_err());

        // Ajuste: zero is a valid count, negatives are not
        assert!(validate_entered_quantity(MovementType::Ajuste, 0).is_ok());
        assert!(validate_entered_quantity(MovementType::Ajuste, -1).is_err());

        // Upper bound applies to all types
        assert!(validate_entered_quantity(MovementType::Entrada, MAX_MOVEMENT_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_negative_unit_cost_rejected() {
        let mut r = request(MovementType::Compra, 5);
        r.unit_cost_cents = Some(-100);
        assert!(validate_movement_request(&r).is_err());
    }

    #[test]
    fn test_register_name() {
        assert!(validate_register_name("Caja 1").is_ok());
        assert!(validate_register_name("").is_err());
        assert!(validate_register_name("   ").is_err());
        assert!(validate_register_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_drawer_amounts() {
        assert!(validate_drawer_amount("opening_amount", 0).is_ok());
        assert!(validate_drawer_amount("opening_amount", 5000).is_ok());
        assert!(validate_drawer_amount("closing_amount", -1).is_err());
    }

    #[test]
    fn test_sale_amount() {
        assert!(validate_sale_amount(100).is_ok());
        assert!(validate_sale_amount(0).is_err());
        assert!(validate_sale_amount(-100).is_err());
    }

    #[test]
    fn test_notes_length() {
        assert!(validate_notes("ok").is_ok());
        assert!(validate_notes(&"x".repeat(MAX_NOTES_LEN + 1)).is_err());
    }
}
