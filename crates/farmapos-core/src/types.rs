//! # Domain Types
//!
//! Core domain types used throughout FarmaPOS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌─────────────────────┐ │
//! │  │ InventoryRecord  │   │    Movement      │   │ CashRegisterSession │ │
//! │  │  ──────────────  │   │  ──────────────  │   │  ─────────────────  │ │
//! │  │  (product,       │   │  id (UUID)       │   │  id (UUID)          │ │
//! │  │   location,      │◄──│  quantity (±)    │   │  register_name      │ │
//! │  │   batch|null)    │   │  stock_before    │   │  opening/closing    │ │
//! │  │  current_stock   │   │  stock_after     │   │  totals by tender   │ │
//! │  └──────────────────┘   └──────────────────┘   └─────────────────────┘ │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌─────────────────────┐ │
//! │  │  MovementType    │   │  SessionStatus   │   │     TenderType      │ │
//! │  │  ──────────────  │   │  ──────────────  │   │  ─────────────────  │ │
//! │  │  Entrada Salida  │   │  Open            │   │  Cash               │ │
//! │  │  Ajuste Venta    │   │  Closed          │   │  Card               │ │
//! │  │  Compra Devol.   │   └──────────────────┘   │  Other              │ │
//! │  │  Transferencia   │                          └─────────────────────┘ │
//! │  └──────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Invariants
//! - `Movement.stock_after = stock_before + quantity`, unconditionally
//! - `InventoryRecord.current_stock` equals the fold of all movement
//!   quantities sharing its (product, location, batch) key, from 0
//! - Movements are append-only: no type here has mutation helpers

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Movement Type
// =============================================================================

/// The type of a stock movement.
///
/// ## Sign Dispatch (the core business rule)
/// ```text
/// entrada / compra / devolucion → delta = +|entered|   (receipts)
/// salida / venta                → delta = -|entered|   (issues)
/// transferencia                 → delta = -|entered|   (outgoing leg)
/// ajuste                        → delta = counted - current
/// ```
/// The dispatch itself lives in [`crate::reconcile`]; this enum only
/// classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Goods received (generic receipt).
    Entrada,
    /// Goods issued (generic issue).
    Salida,
    /// Physical count adjustment - the user enters the COUNTED stock,
    /// the stored quantity is the derived delta.
    Ajuste,
    /// Transfer between locations (the outgoing leg decreases stock).
    Transferencia,
    /// Point-of-sale checkout.
    Venta,
    /// Purchase-order receiving.
    Compra,
    /// Customer return.
    Devolucion,
}

impl MovementType {
    /// Receipt-type movements always increase stock.
    #[inline]
    pub const fn is_receipt(&self) -> bool {
        matches!(
            self,
            MovementType::Entrada | MovementType::Compra | MovementType::Devolucion
        )
    }

    /// Issue-type movements always decrease stock.
    /// Transfers count as issues: only the outgoing leg is derived from
    /// the entered quantity.
    #[inline]
    pub const fn is_issue(&self) -> bool {
        matches!(
            self,
            MovementType::Salida | MovementType::Venta | MovementType::Transferencia
        )
    }

    /// Spanish display label, as shown in the kardex and on tickets.
    pub const fn label(&self) -> &'static str {
        match self {
            MovementType::Entrada => "Entrada",
            MovementType::Salida => "Salida",
            MovementType::Ajuste => "Ajuste",
            MovementType::Transferencia => "Transferencia",
            MovementType::Venta => "Venta",
            MovementType::Compra => "Compra",
            MovementType::Devolucion => "Devolución",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Inventory Record
// =============================================================================

/// The authoritative per-(product, location, batch) stock record.
///
/// ## Lifecycle
/// Created on the first movement referencing a new key, updated on every
/// subsequent movement, never deleted - zero stock is a valid state, not
/// an absence.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryRecord {
    /// Product this record belongs to.
    pub product_id: String,

    /// Location (warehouse, shelf, branch) this record belongs to.
    pub location_id: String,

    /// Batch/lot number. `None` means the un-batched pool for the
    /// (product, location) pair.
    pub batch_number: Option<String>,

    /// Current stock level. Always >= 0.
    pub current_stock: i64,

    /// Units reserved (e.g., for pending orders). Always >= 0.
    pub reserved_stock: i64,

    /// Expiry date of the batch, when tracked.
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,

    /// When the record was created (first movement on this key).
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    /// Stock available for sale: current minus reserved.
    #[inline]
    pub fn available_stock(&self) -> i64 {
        self.current_stock - self.reserved_stock
    }
}

// =============================================================================
// Movement
// =============================================================================

/// An append-only entry in the stock movement ledger.
///
/// ## Snapshot Pattern
/// `stock_before`/`stock_after` freeze the record state at write time, so
/// the kardex reads correctly even as later movements change the record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Movement {
    /// Unique identifier (UUID v4). Immutable once created.
    pub id: String,

    pub product_id: String,
    pub location_id: String,
    pub batch_number: Option<String>,

    pub movement_type: MovementType,

    /// The SIGNED delta actually applied - NOT always the user-entered
    /// magnitude. For `ajuste` this is `counted - previous`, for issues
    /// it is negative.
    pub quantity: i64,

    /// Stock on the record immediately before this movement.
    pub stock_before: i64,

    /// Stock immediately after. Equals `stock_before + quantity`.
    pub stock_after: i64,

    /// Unit cost in cents, when supplied. Informational only - never
    /// participates in the stock computation.
    pub unit_cost_cents: Option<i64>,

    /// Total cost in cents: `unit_cost × |entered quantity|`.
    pub total_cost_cents: Option<i64>,

    /// Expiry date carried with batch receipts.
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,

    /// Free-form notes.
    pub notes: Option<String>,

    /// Link to the originating sale/purchase/transfer, when any.
    pub reference_id: Option<String>,
    pub reference_type: Option<String>,

    /// User who recorded the movement (attribution, optional).
    pub user_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// Returns the unit cost as Money, if recorded.
    #[inline]
    pub fn unit_cost(&self) -> Option<Money> {
        self.unit_cost_cents.map(Money::from_cents)
    }

    /// Returns the total cost as Money, if recorded.
    #[inline]
    pub fn total_cost(&self) -> Option<Money> {
        self.total_cost_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Movement Request
// =============================================================================

/// A movement as entered on the movement form, before reconciliation.
///
/// `entered_quantity` is what the user typed: a magnitude for receipts and
/// issues, the counted absolute stock for `ajuste`. The engine derives the
/// signed delta from it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MovementRequest {
    pub product_id: String,
    pub location_id: String,
    pub batch_number: Option<String>,
    pub movement_type: MovementType,
    pub entered_quantity: i64,
    pub unit_cost_cents: Option<i64>,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub reference_id: Option<String>,
    pub reference_type: Option<String>,
    pub user_id: Option<String>,
}

// =============================================================================
// Kardex Entry
// =============================================================================

/// A movement joined with product/location reference data for display.
///
/// This is the row shape the kardex table and CSV export consume. Read
/// side only: produced by the ledger query, never written back.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct KardexEntry {
    pub id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub unit_cost_cents: Option<i64>,
    pub total_cost_cents: Option<i64>,
    pub batch_number: Option<String>,
    pub notes: Option<String>,
    pub user_id: Option<String>,

    pub product_id: String,
    pub product_name: String,
    pub product_sku: String,
    pub product_barcode: Option<String>,

    pub location_id: String,
    pub location_name: String,
}

// =============================================================================
// Reference Data (read-only lookups)
// =============================================================================

/// Product reference data joined into movement/record display.
/// The ledger core never mutates products; catalog screens own them.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductRef {
    pub id: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub category: Option<String>,
}

/// Location reference data.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LocationRef {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Session Status
// =============================================================================

/// The status of a cash register session.
///
/// State machine: `open → closed` (terminal per-instance; a register can
/// open a NEW session after closing the previous one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session is accumulating sales.
    Open,
    /// Session has been balanced and closed. Terminal.
    Closed,
}

// =============================================================================
// Tender Type
// =============================================================================

/// How a sale was paid, for session total accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TenderType {
    /// Physical cash - the only tender that lands in the drawer and
    /// therefore the only one entering `expected_amount`.
    Cash,
    /// Card terminal.
    Card,
    /// Vouchers, transfers, anything else.
    Other,
}

// =============================================================================
// Cash Register Session
// =============================================================================

/// One open→accumulate→close cycle of a cash register.
///
/// ## Reconciliation
/// `expected = opening + total_cash`; `difference = closing - expected`.
/// The sign is meaningful: positive = surplus, negative = shortage.
/// See [`crate::session`] for the derived math.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashRegisterSession {
    pub id: String,

    /// Register this session belongs to (e.g., "Caja 1").
    pub register_name: String,

    /// Cash in the drawer at open. Always >= 0.
    pub opening_cents: i64,

    /// Counted cash at close. Set exactly once, at close time, never
    /// retroactively edited. `None` while open.
    pub closing_cents: Option<i64>,

    /// Accumulated totals. Monotonically non-decreasing while open.
    pub total_sales_cents: i64,
    pub total_cash_cents: i64,
    pub total_card_cents: i64,
    pub total_other_cents: i64,

    pub status: SessionStatus,

    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,

    pub notes: Option<String>,

    /// User who opened the session (attribution, optional).
    pub user_id: Option<String>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_type_classification() {
        assert!(MovementType::Entrada.is_receipt());
        assert!(MovementType::Compra.is_receipt());
        assert!(MovementType::Devolucion.is_receipt());

        assert!(MovementType::Salida.is_issue());
        assert!(MovementType::Venta.is_issue());
        assert!(MovementType::Transferencia.is_issue());

        // Ajuste is neither: its sign depends on the count
        assert!(!MovementType::Ajuste.is_receipt());
        assert!(!MovementType::Ajuste.is_issue());
    }

    #[test]
    fn test_movement_type_labels() {
        assert_eq!(MovementType::Devolucion.to_string(), "Devolución");
        assert_eq!(MovementType::Ajuste.to_string(), "Ajuste");
    }

    #[test]
    fn test_available_stock() {
        let now = Utc::now();
        let record = InventoryRecord {
            product_id: "p1".into(),
            location_id: "l1".into(),
            batch_number: None,
            current_stock: 10,
            reserved_stock: 3,
            expiry_date: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(record.available_stock(), 7);
    }

    #[test]
    fn test_movement_money_accessors() {
        let now = Utc::now();
        let movement = Movement {
            id: "m1".into(),
            product_id: "p1".into(),
            location_id: "l1".into(),
            batch_number: None,
            movement_type: MovementType::Compra,
            quantity: 4,
            stock_before: 0,
            stock_after: 4,
            unit_cost_cents: Some(1250),
            total_cost_cents: Some(5000),
            expiry_date: None,
            notes: None,
            reference_id: None,
            reference_type: None,
            user_id: None,
            created_at: now,
        };

        assert_eq!(movement.unit_cost().unwrap().cents(), 1250);
        assert_eq!(movement.total_cost().unwrap().to_string(), "$50.00");
    }
}
