//! Presentation shaping shared by all report commands.
//!
//! Analytics outputs are flattened into a `TabularReport`, then optionally
//! filtered, regrouped into the warehouse picking layout, and written to
//! the console, CSV files or JSON. Filters never alter the computation,
//! only what is shown.

mod export;
mod filters;
mod tabular;

pub use export::{
    export_per_store, store_column_index, to_json_string, to_picking, write_csv,
    write_csv_to, PICKING_COLUMNS,
};
pub use filters::{apply_filters, ReportFilters};
pub use tabular::{
    brand_products_table, brand_stores_table, coverage_table, redistribution_table,
    restock_table, stock_table,
};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report '{0}' has no rows, nothing to export")]
    EmptyReport(String),

    #[error("report '{0}' has no store column to group by")]
    NoStoreColumn(String),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A titled table of text cells. Every report command produces one (or
/// several) of these before presentation.
#[derive(Clone, Debug, Serialize)]
pub struct TabularReport {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularReport {
    pub fn new(title: &str, columns: &[&str]) -> Self {
        TabularReport {
            title: title.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
