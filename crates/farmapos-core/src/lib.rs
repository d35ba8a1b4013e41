//! # farmapos-core: Pure Business Logic for FarmaPOS
//!
//! This crate is the **heart** of the pharmacy POS. It contains all business
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       FarmaPOS Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     Frontend (Web UI)                           │   │
//! │  │   Movement Form ──► Kardex ──► Cash Register ──► Daily Balance  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ farmapos-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐ │   │
//! │  │  │  types   │ │reconcile │ │ session  │ │ kardex  │ │ ticket │ │   │
//! │  │  │ Movement │ │ StockΔ   │ │ Daily    │ │ filter  │ │ close  │ │   │
//! │  │  │ Session  │ │ engine   │ │ Balance  │ │ + CSV   │ │ ticket │ │   │
//! │  │  └──────────┘ └──────────┘ └──────────┘ └─────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  farmapos-db (Database Layer)                   │   │
//! │  │         SQLite queries, migrations, ledger repositories         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Movement, InventoryRecord, CashRegisterSession, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`reconcile`] - Stock reconciliation engine (movement-type dispatch)
//! - [`session`] - Cash session math and the daily balance aggregator
//! - [`kardex`] - Movement-history filtering and CSV export
//! - [`ticket`] - Close-ticket payload and printer observer service
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use farmapos_core::reconcile::reconcile;
//! use farmapos_core::types::MovementType;
//!
//! // Adjustment: the user enters the COUNTED stock, the engine derives the delta
//! let delta = reconcile(MovementType::Ajuste, 20, 7).unwrap();
//! assert_eq!(delta.quantity, 13);
//! assert_eq!(delta.stock_after, 20);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod kardex;
pub mod money;
pub mod reconcile;
pub mod session;
pub mod ticket;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use farmapos_core::Money` instead of
// `use farmapos_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use reconcile::{reconcile, StockDelta};
pub use session::DailyBalance;
pub use ticket::{CloseTicket, TicketService, TicketSubscription};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity accepted on a single movement entry.
///
/// ## Business Reason
/// Prevents accidental fat-finger entries (e.g., scanning a barcode into
/// the quantity field). Pharmacy receiving rarely exceeds a few thousand
/// units per line.
pub const MAX_MOVEMENT_QUANTITY: i64 = 1_000_000;

/// Maximum length of the free-form notes field on movements and sessions.
pub const MAX_NOTES_LEN: usize = 500;

/// Maximum length of a cash register name.
pub const MAX_REGISTER_NAME_LEN: usize = 100;
