//! # farmapos-db: Database Layer for FarmaPOS
//!
//! This crate provides database access for the FarmaPOS inventory ledger.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       FarmaPOS Data Flow                                │
//! │                                                                         │
//! │  UI action (record movement, open session, export kardex)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    farmapos-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐ │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │    │ inventory.rs   │    │  (embedded)  │ │   │
//! │  │   │               │    │ session.rs     │    │              │ │   │
//! │  │   │ SqlitePool    │◄───│ reference.rs   │    │ 001_init.sql │ │   │
//! │  │   │ Management    │    │                │    │              │ │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘ │   │
//! │  │            │                    │                              │   │
//! │  │            │                    ▼                              │   │
//! │  │            │      farmapos-core (pure logic: reconcile,       │   │
//! │  │            │      session math, validation - no I/O)          │   │
//! │  └────────────┼────────────────────────────────────────────────────┘  │
//! │               ▼                                                        │
//! │  ┌─────────────────────────────────────────────────────────────────┐  │
//! │  │                     SQLite Database (WAL)                       │  │
//! │  └─────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (inventory, session, reference)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use farmapos_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/farmapos.db")).await?;
//!
//! // Record a sale of 3 units against the un-batched pool
//! let movement = db.inventory().record_movement(&request).await?;
//!
//! // Open the drawer for the day
//! let session = db.sessions().open("Caja 1", 5000, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::inventory::InventoryRepository;
pub use repository::reference::ReferenceRepository;
pub use repository::session::SessionRepository;
