//! # Repository Module
//!
//! Database repository implementations for FarmaPOS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  UI action                                                             │
//! │       │                                                                 │
//! │       │  db.inventory().record_movement(&request)                      │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  InventoryRepository                                                   │
//! │  ├── record_movement(&self, request)     ← transactional + CAS        │
//! │  ├── record_transfer(&self, ...)         ← both legs, one txn         │
//! │  ├── get_record(&self, key)                                            │
//! │  └── kardex(&self, filter)                                             │
//! │       │                                                                 │
//! │       │  SQL (runtime-bound, no macros)                                │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Business math stays in farmapos-core (pure, unit-tested)            │
//! │  • SQL is isolated in one place per aggregate                          │
//! │  • Transactions wrap every multi-statement write                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`inventory::InventoryRepository`] - Movement ledger, stock records, kardex
//! - [`session::SessionRepository`] - Cash register sessions and daily balance
//! - [`reference::ReferenceRepository`] - Product/location lookups and seeding

pub mod inventory;
pub mod reference;
pub mod session;
