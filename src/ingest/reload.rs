//! The destructive full reload: parse the three exports and swap the raw
//! tables in one transaction.

use super::parse::{parse_sales_history, parse_store_stock, parse_warehouse_stock};
use super::IngestError;
use crate::snapshot_store::{
    ReloadCounts, ReloadOutcome, ReloadRun, SnapshotStore, SnapshotTables,
};
use chrono::Utc;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

pub const STORE_STOCK_FILE: &str = "1.Ventas-Saldos.csv";
pub const WAREHOUSE_STOCK_FILE: &str = "2.Inventario-Bodega.csv";
pub const SALES_HISTORY_FILE: &str = "3.Ventas-Historico.csv";

#[derive(Debug)]
pub struct ReloadStats {
    pub counts: ReloadCounts,
    pub skipped_rows: usize,
    pub elapsed: Duration,
}

fn read_input(inputs_dir: &Path, name: &str) -> Result<Vec<u8>, IngestError> {
    let path = inputs_dir.join(name);
    if !path.is_file() {
        return Err(IngestError::MissingInput(path));
    }
    std::fs::read(&path).map_err(|e| IngestError::Io(path, e))
}

/// Replaces the snapshot tables from the exports under `inputs_dir`.
///
/// All three files must be present and parse before anything is written;
/// a failed reload leaves the previous tables untouched. The outcome is
/// recorded in the reload log either way.
pub fn run_full_reload(
    store: &dyn SnapshotStore,
    inputs_dir: &Path,
) -> Result<ReloadStats, IngestError> {
    let started_at = Utc::now();
    let timer = Instant::now();

    let result = reload_inner(store, inputs_dir);

    let (counts, skipped_rows, outcome) = match &result {
        Ok((counts, skipped)) => (*counts, *skipped, ReloadOutcome::Completed),
        Err(_) => (ReloadCounts::default(), 0, ReloadOutcome::Failed),
    };
    let run = ReloadRun {
        id: None,
        started_at,
        finished_at: Utc::now(),
        counts,
        skipped_rows,
        outcome,
    };
    if let Err(e) = store.record_reload(&run) {
        warn!("Failed to record reload run: {}", e);
    }

    match result {
        Ok((counts, skipped_rows)) => {
            info!(
                "Reload complete: {} store stock, {} warehouse stock, {} sales rows ({} skipped)",
                counts.store_stock, counts.warehouse_stock, counts.sales_history, skipped_rows
            );
            Ok(ReloadStats {
                counts,
                skipped_rows,
                elapsed: timer.elapsed(),
            })
        }
        Err(e) => {
            error!("Reload failed: {}", e);
            Err(e)
        }
    }
}

fn reload_inner(
    store: &dyn SnapshotStore,
    inputs_dir: &Path,
) -> Result<(ReloadCounts, usize), IngestError> {
    let store_stock_bytes = read_input(inputs_dir, STORE_STOCK_FILE)?;
    let warehouse_bytes = read_input(inputs_dir, WAREHOUSE_STOCK_FILE)?;
    let sales_bytes = read_input(inputs_dir, SALES_HISTORY_FILE)?;

    let store_stock = parse_store_stock(&store_stock_bytes)?;
    let warehouse_stock = parse_warehouse_stock(&warehouse_bytes)?;
    let sales_history = parse_sales_history(&sales_bytes)?;

    let skipped = store_stock.skipped + warehouse_stock.skipped + sales_history.skipped;
    if skipped > 0 {
        warn!("Skipped {} malformed rows across the three exports", skipped);
    }

    let counts = store.replace_all(SnapshotTables {
        store_stock: store_stock.rows,
        warehouse_stock: warehouse_stock.rows,
        sales_history: sales_history.rows,
    })?;
    Ok((counts, skipped))
}
