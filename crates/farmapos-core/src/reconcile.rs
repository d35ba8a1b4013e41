//! # Stock Reconciliation Engine
//!
//! The pure computation that, given a movement type and requested
//! quantity, derives the signed quantity delta and the resulting stock
//! value, and vetoes moves that would drive stock negative.
//!
//! ## Movement-Type Dispatch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Delta Derivation                                   │
//! │                                                                         │
//! │  entrada / compra / devolucion                                         │
//! │       delta = +|entered|          (receipts always increase stock)     │
//! │                                                                         │
//! │  salida / venta                                                        │
//! │       delta = -|entered|          (issues always decrease stock)       │
//! │                                                                         │
//! │  transferencia                                                         │
//! │       delta = -|entered|          (outgoing leg; incoming leg is a     │
//! │                                    second movement, see farmapos-db)   │
//! │                                                                         │
//! │  ajuste                                                                │
//! │       delta = |entered| - current (user enters the COUNTED stock;      │
//! │                                    the stored quantity is the delta,   │
//! │                                    NOT the raw entry)                  │
//! │                                                                         │
//! │  Then, for EVERY type uniformly:                                       │
//! │       new_stock = current + delta                                      │
//! │       new_stock < 0  →  InsufficientStock, nothing written             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Ajuste Pitfall
//! The adjustment form asks for the real/counted shelf value. Persisting
//! the raw entry instead of the difference is the classic bug here: a
//! count of 20 over a stock of 7 must store quantity **13** (and
//! stock_after 20). Tested explicitly below.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::MovementType;
use crate::MAX_MOVEMENT_QUANTITY;

// =============================================================================
// Stock Delta
// =============================================================================

/// The outcome of reconciling one movement request against current stock.
///
/// Constructed only by [`reconcile`], so `stock_after = stock_before +
/// quantity` holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDelta {
    /// Signed delta to persist as `Movement.quantity`.
    pub quantity: i64,
    /// Stock at read time (the snapshot the CAS update is keyed on).
    pub stock_before: i64,
    /// Resulting stock. Always >= 0.
    pub stock_after: i64,
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Derives the signed delta and resulting stock for a movement request.
///
/// ## Arguments
/// * `movement_type` - what kind of movement the user selected
/// * `entered_quantity` - the positive magnitude as typed; for `ajuste`
///   this is the counted absolute stock value
/// * `current_stock` - the record's stock at read time
///
/// ## Errors
/// * [`CoreError::InsufficientStock`] when the resulting stock would be
///   negative. The caller must not write anything in that case.
/// * [`CoreError::Validation`] for an entry whose magnitude is not
///   representable (`i64::MIN`).
///
/// ## Example
/// ```rust
/// use farmapos_core::reconcile::reconcile;
/// use farmapos_core::types::MovementType;
///
/// // venta 3 over stock 10 → delta -3, stock 7
/// let d = reconcile(MovementType::Venta, 3, 10).unwrap();
/// assert_eq!((d.quantity, d.stock_after), (-3, 7));
///
/// // salida 25 over stock 20 → rejected
/// assert!(reconcile(MovementType::Salida, 25, 20).is_err());
/// ```
pub fn reconcile(
    movement_type: MovementType,
    entered_quantity: i64,
    current_stock: i64,
) -> CoreResult<StockDelta> {
    // i64::MIN has no positive counterpart; reject instead of panicking
    let magnitude = entered_quantity
        .checked_abs()
        .ok_or(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_MOVEMENT_QUANTITY,
        })?;

    let delta = match movement_type {
        MovementType::Entrada | MovementType::Compra | MovementType::Devolucion => magnitude,
        MovementType::Salida | MovementType::Venta | MovementType::Transferencia => -magnitude,
        // The entered value is the counted absolute stock; persist the
        // difference, not the entry.
        MovementType::Ajuste => magnitude - current_stock,
    };

    let new_stock = current_stock + delta;

    // Uniform guard, including adjustments: a counted value >= 0 can never
    // land here, but the check runs for every type regardless.
    if new_stock < 0 {
        return Err(CoreError::InsufficientStock {
            available: current_stock,
            requested: magnitude,
        });
    }

    Ok(StockDelta {
        quantity: delta,
        stock_before: current_stock,
        stock_after: new_stock,
    })
}

/// Computes the informational total cost for a movement.
///
/// `total_cost = unit_cost × |entered|` when a unit cost was supplied,
/// else `None`. Cost fields never participate in the stock computation.
#[inline]
pub fn total_cost_cents(unit_cost_cents: Option<i64>, entered_quantity: i64) -> Option<i64> {
    unit_cost_cents.map(|cents| cents * entered_quantity.abs())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipts_increase_stock() {
        for mt in [
            MovementType::Entrada,
            MovementType::Compra,
            MovementType::Devolucion,
        ] {
            let d = reconcile(mt, 5, 10).unwrap();
            assert_eq!(d.quantity, 5);
            assert_eq!(d.stock_before, 10);
            assert_eq!(d.stock_after, 15);
        }
    }

    #[test]
    fn test_issues_decrease_stock() {
        for mt in [
            MovementType::Salida,
            MovementType::Venta,
            MovementType::Transferencia,
        ] {
            let d = reconcile(mt, 3, 10).unwrap();
            assert_eq!(d.quantity, -3);
            assert_eq!(d.stock_after, 7);
        }
    }

    /// Spec scenario: stock 10, venta 3 → delta -3, stock_after 7.
    #[test]
    fn test_venta_scenario() {
        let d = reconcile(MovementType::Venta, 3, 10).unwrap();
        assert_eq!(d.quantity, -3);
        assert_eq!(d.stock_after, 7);
    }

    /// The adjustment stores the DIFFERENCE, not the entered value.
    /// Stock 7, counted 20 → quantity 13, stock_after 20.
    #[test]
    fn test_ajuste_persists_delta_not_entry() {
        let d = reconcile(MovementType::Ajuste, 20, 7).unwrap();
        assert_eq!(d.quantity, 13);
        assert_eq!(d.stock_before, 7);
        assert_eq!(d.stock_after, 20);
    }

    #[test]
    fn test_ajuste_downward_count() {
        // Counted 4 over stock 9 → shrink by 5
        let d = reconcile(MovementType::Ajuste, 4, 9).unwrap();
        assert_eq!(d.quantity, -5);
        assert_eq!(d.stock_after, 4);
    }

    #[test]
    fn test_ajuste_to_zero() {
        let d = reconcile(MovementType::Ajuste, 0, 9).unwrap();
        assert_eq!(d.quantity, -9);
        assert_eq!(d.stock_after, 0);
    }

    /// Spec scenario: stock 20, salida 25 → rejected, nothing computed.
    #[test]
    fn test_insufficient_stock_rejected() {
        let err = reconcile(MovementType::Salida, 25, 20).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                available,
                requested,
            } => {
                assert_eq!(available, 20);
                assert_eq!(requested, 25);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_transfer_outgoing_leg_guarded() {
        assert!(reconcile(MovementType::Transferencia, 11, 10).is_err());
        assert!(reconcile(MovementType::Transferencia, 10, 10).is_ok());
    }

    /// Before/after consistency holds for every computed delta.
    #[test]
    fn test_before_after_consistency() {
        let cases = [
            (MovementType::Entrada, 7, 0),
            (MovementType::Venta, 2, 5),
            (MovementType::Ajuste, 12, 40),
            (MovementType::Devolucion, 1, 99),
        ];
        for (mt, entered, current) in cases {
            let d = reconcile(mt, entered, current).unwrap();
            assert_eq!(d.stock_after, d.stock_before + d.quantity);
            assert!(d.stock_after >= 0);
        }
    }

    #[test]
    fn test_unrepresentable_magnitude_rejected() {
        let err = reconcile(MovementType::Venta, i64::MIN, 10).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_total_cost() {
        assert_eq!(total_cost_cents(Some(250), 4), Some(1000));
        assert_eq!(total_cost_cents(None, 4), None);
    }
}
