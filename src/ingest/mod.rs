//! CSV ingestion: decoding the Mahalo ERP exports and running full reloads.

mod parse;
mod reload;

pub use parse::{
    normalize_header, parse_sales_history, parse_store_stock, parse_warehouse_stock, ParsedFile,
};
pub use reload::{
    run_full_reload, ReloadStats, SALES_HISTORY_FILE, STORE_STOCK_FILE, WAREHOUSE_STOCK_FILE,
};

use crate::snapshot_store::SnapshotError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    #[error("required column '{column}' not found in {file}")]
    MissingColumn { file: String, column: String },

    #[error("failed to read {0}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Db(#[from] SnapshotError),
}
