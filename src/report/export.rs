//! Export backends: CSV (single file or one per store), JSON, and the
//! warehouse picking layout.

use super::{ReportError, TabularReport};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Column layout of the picking sheets the warehouse works from.
pub const PICKING_COLUMNS: [&str; 5] = ["Cod.Barras", "Marca", "Color", "Cantidad", "Observacion"];

const STORE_COLUMN_CANDIDATES: [&str; 3] = ["store", "origin_store", "destination_store"];
const QUANTITY_COLUMN_CANDIDATES: [&str; 4] = ["assigned", "suggested", "need", "requested"];
const STORE_FILE_NAME_MAX: usize = 25;

/// The column a report groups by when splitting per store.
pub fn store_column_index(report: &TabularReport) -> Result<usize, ReportError> {
    STORE_COLUMN_CANDIDATES
        .iter()
        .find_map(|name| report.column_index(name))
        .ok_or_else(|| ReportError::NoStoreColumn(report.title.clone()))
}

fn quantity_column_index(report: &TabularReport) -> Option<usize> {
    QUANTITY_COLUMN_CANDIDATES
        .iter()
        .find_map(|name| report.column_index(name))
}

/// Reduces a report to the five picking columns, rows sorted by store.
/// Quantity comes from the first allocation-like column the report has.
pub fn to_picking(report: &TabularReport) -> Result<TabularReport, ReportError> {
    let store_col = store_column_index(report)?;
    let barcode_col = report
        .column_index("barcode")
        .ok_or_else(|| ReportError::UnknownColumn("barcode".to_string()))?;
    let brand_col = report.column_index("brand");
    let color_col = report.column_index("color");
    let quantity_col = quantity_column_index(report);
    let status_col = report.column_index("status");

    let mut rows: Vec<&Vec<String>> = report.rows.iter().collect();
    rows.sort_by(|a, b| a[store_col].cmp(&b[store_col]));

    let mut picking = TabularReport::new(&report.title, &PICKING_COLUMNS);
    for row in rows {
        picking.rows.push(vec![
            row[barcode_col].clone(),
            brand_col.map(|i| row[i].clone()).unwrap_or_default(),
            color_col.map(|i| row[i].clone()).unwrap_or_default(),
            quantity_col.map(|i| row[i].clone()).unwrap_or_default(),
            status_col.map(|i| row[i].clone()).unwrap_or_default(),
        ]);
    }
    Ok(picking)
}

pub fn write_csv_to<W: Write>(report: &TabularReport, writer: W) -> Result<(), ReportError> {
    if report.is_empty() {
        return Err(ReportError::EmptyReport(report.title.clone()));
    }
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&report.columns)?;
    for row in &report.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_csv(report: &TabularReport, path: &Path) -> Result<(), ReportError> {
    if report.is_empty() {
        return Err(ReportError::EmptyReport(report.title.clone()));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    write_csv_to(report, file)?;
    info!("Wrote {} rows to {}", report.rows.len(), path.display());
    Ok(())
}

pub fn to_json_string(report: &TabularReport) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// File-system friendly store name: alphanumerics kept, whitespace to
/// underscores, truncated to the length the warehouse tooling expects.
fn store_file_name(store: &str) -> String {
    let mut name: String = store
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '_'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect();
    name.truncate(STORE_FILE_NAME_MAX);
    let trimmed = name.trim_matches('_').to_string();
    if trimmed.is_empty() {
        "SIN_TIENDA".to_string()
    } else {
        trimmed
    }
}

/// Writes one CSV per store under `out_dir`, optionally in picking
/// layout. Returns the written paths, sorted by store.
pub fn export_per_store(
    report: &TabularReport,
    out_dir: &Path,
    picking: bool,
) -> Result<Vec<PathBuf>, ReportError> {
    if report.is_empty() {
        return Err(ReportError::EmptyReport(report.title.clone()));
    }
    let store_col = store_column_index(report)?;

    let mut groups: BTreeMap<String, Vec<Vec<String>>> = BTreeMap::new();
    for row in &report.rows {
        groups
            .entry(row[store_col].clone())
            .or_default()
            .push(row.clone());
    }

    std::fs::create_dir_all(out_dir)?;
    let mut paths = Vec::with_capacity(groups.len());
    for (store, rows) in groups {
        let group = TabularReport {
            title: format!("{} - {}", report.title, store),
            columns: report.columns.clone(),
            rows,
        };
        let group = if picking { to_picking(&group)? } else { group };
        let path = out_dir.join(format!("{}.csv", store_file_name(&store)));
        write_csv(&group, &path)?;
        paths.push(path);
    }
    Ok(paths)
}
