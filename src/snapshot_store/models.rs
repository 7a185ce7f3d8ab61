//! Row types for the raw ERP snapshot tables and the reload audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of `store_stock`, parsed from `1.Ventas-Saldos.csv`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStockRow {
    pub barcode: String,
    pub brand: String,
    pub color: String,
    /// ERP warehouse/store name, exactly as exported.
    pub store_raw: String,
    pub available: i64,
}

/// One row of `warehouse_stock`, parsed from `2.Inventario-Bodega.csv`.
/// A barcode may appear on several rows; consumers aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseStockRow {
    pub barcode: String,
    pub available: i64,
}

/// One row of `sales_history`, parsed from `3.Ventas-Historico.csv`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRow {
    pub barcode: String,
    pub brand: String,
    pub store_raw: String,
    /// Units sold; negative for returns.
    pub units: i64,
    /// ISO `YYYY-MM-DD`, converted from the export's `DD/MM/YYYY`.
    pub sold_on: String,
}

/// The fully parsed content of one reload, swapped into the raw tables
/// in a single transaction.
#[derive(Clone, Debug, Default)]
pub struct SnapshotTables {
    pub store_stock: Vec<StoreStockRow>,
    pub warehouse_stock: Vec<WarehouseStockRow>,
    pub sales_history: Vec<SalesRow>,
}

/// Per-table row counts after a reload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReloadCounts {
    pub store_stock: usize,
    pub warehouse_stock: usize,
    pub sales_history: usize,
}

/// Current row counts of the raw tables, for `status`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub store_stock: i64,
    pub warehouse_stock: i64,
    pub sales_history: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ReloadOutcome {
    Completed,
    Failed,
}

impl ReloadOutcome {
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "COMPLETED" => ReloadOutcome::Completed,
            _ => ReloadOutcome::Failed,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReloadOutcome::Completed => "COMPLETED",
            ReloadOutcome::Failed => "FAILED",
        }
    }
}

/// One audit row of `reload_log`. The log survives reloads.
#[derive(Clone, Debug, Serialize)]
pub struct ReloadRun {
    pub id: Option<i64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub counts: ReloadCounts,
    pub skipped_rows: usize,
    pub outcome: ReloadOutcome,
}

/// A distinct product reference observed in the store stock export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductRef {
    pub barcode: String,
    pub brand: String,
    pub color: String,
}

/// Sales aggregated per (raw store, barcode, brand) over a window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SalesAgg {
    pub store_raw: String,
    pub barcode: String,
    pub brand: String,
    pub units: i64,
}

/// One product of a brand ranked by sales over the last 30 days.
#[derive(Clone, Debug, Serialize)]
pub struct BrandSeller {
    pub barcode: String,
    pub brand: String,
    pub color: Option<String>,
    pub units: i64,
}
