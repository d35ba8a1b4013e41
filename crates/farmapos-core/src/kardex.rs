//! # Kardex View
//!
//! Stateless filter/export layer over movement-ledger results already
//! fetched. No new invariants beyond what the ledger guarantees.
//!
//! ## Filter Composition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Kardex Filtering (AND semantics)                    │
//! │                                                                         │
//! │  fetched entries                                                       │
//! │       │                                                                 │
//! │       ├── product?        ── equality                                  │
//! │       ├── location?       ── equality                                  │
//! │       ├── movement type?  ── equality                                  │
//! │       ├── batch?          ── equality                                  │
//! │       ├── date range?     ── inclusive bounds                          │
//! │       └── free text?      ── name | SKU | barcode | notes contains     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  filtered entries ──► table render ──► "Exportar" ──► CSV bytes        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same [`KardexFilter`] shape drives the SQL-side query in
//! farmapos-db; this module applies it in memory and owns the CSV export,
//! a pure, idempotent transform with no side effects beyond the artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{KardexEntry, MovementType};

/// Fixed CSV header, in export column order.
pub const CSV_HEADER: [&str; 12] = [
    "Fecha",
    "Producto",
    "SKU",
    "Tipo",
    "Cantidad",
    "Stock Anterior",
    "Stock Posterior",
    "Costo",
    "Ubicación",
    "Lote",
    "Usuario",
    "Notas",
];

/// Export date format: `dd/MM/yyyy HH:mm`.
const CSV_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

// =============================================================================
// Kardex Filter
// =============================================================================

/// Composable movement-history filters. All present filters apply
/// conjunctively (AND semantics).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KardexFilter {
    pub product_id: Option<String>,
    pub location_id: Option<String>,
    pub movement_type: Option<MovementType>,
    pub batch_number: Option<String>,

    /// Inclusive lower bound on `created_at`.
    #[ts(as = "Option<String>")]
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    #[ts(as = "Option<String>")]
    pub date_to: Option<DateTime<Utc>>,

    /// Case-insensitive search over product name, SKU, barcode and notes.
    pub text: Option<String>,

    /// Paging, applied by the SQL-side query only.
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl KardexFilter {
    /// True when the entry passes every present filter.
    pub fn matches(&self, entry: &KardexEntry) -> bool {
        if let Some(product_id) = &self.product_id {
            if &entry.product_id != product_id {
                return false;
            }
        }
        if let Some(location_id) = &self.location_id {
            if &entry.location_id != location_id {
                return false;
            }
        }
        if let Some(movement_type) = self.movement_type {
            if entry.movement_type != movement_type {
                return false;
            }
        }
        if let Some(batch) = &self.batch_number {
            if entry.batch_number.as_deref() != Some(batch.as_str()) {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if entry.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if entry.created_at > to {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.trim().to_lowercase();
            if !needle.is_empty() && !text_matches(entry, &needle) {
                return false;
            }
        }
        true
    }

    /// Applies the filter to already-fetched entries, preserving order.
    pub fn apply<'a>(&self, entries: &'a [KardexEntry]) -> Vec<&'a KardexEntry> {
        entries.iter().filter(|e| self.matches(e)).collect()
    }
}

fn text_matches(entry: &KardexEntry, needle: &str) -> bool {
    entry.product_name.to_lowercase().contains(needle)
        || entry.product_sku.to_lowercase().contains(needle)
        || entry
            .product_barcode
            .as_deref()
            .is_some_and(|b| b.to_lowercase().contains(needle))
        || entry
            .notes
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(needle))
}

// =============================================================================
// CSV Export
// =============================================================================

/// Serializes kardex entries to CSV bytes (UTF-8).
///
/// Pure and idempotent: same entries in, same bytes out, no side effects.
/// One fixed header row, one row per movement, dates as `dd/MM/yyyy HH:mm`.
///
/// ## Example
/// ```rust,ignore
/// let bytes = kardex::export_csv(&entries)?;
/// // hand bytes + export_filename(Utc::now()) to the download action
/// ```
pub fn export_csv(entries: &[KardexEntry]) -> CoreResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| CoreError::ExportFailed(e.to_string()))?;

    for entry in entries {
        let cost = entry
            .total_cost_cents
            .map(|cents| Money::from_cents(cents).to_string())
            .unwrap_or_default();

        writer
            .write_record([
                entry.created_at.format(CSV_DATE_FORMAT).to_string(),
                entry.product_name.clone(),
                entry.product_sku.clone(),
                entry.movement_type.label().to_string(),
                entry.quantity.to_string(),
                entry.stock_before.to_string(),
                entry.stock_after.to_string(),
                cost,
                entry.location_name.clone(),
                entry.batch_number.clone().unwrap_or_default(),
                entry.user_id.clone().unwrap_or_default(),
                entry.notes.clone().unwrap_or_default(),
            ])
            .map_err(|e| CoreError::ExportFailed(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| CoreError::ExportFailed(e.to_string()))
}

/// Export filename for a given export moment: `kardex_<yyyy-MM-dd>.csv`.
#[inline]
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("kardex_{}.csv", now.format("%Y-%m-%d"))
}

// =============================================================================
// Unit Tests
// =============================================================================
