//! Parsing of the three ERP export files.
//!
//! The exports are latin-1, `;`-separated, and hand-maintained enough that
//! rows with broken numbers or dates are expected. Such rows are skipped
//! and counted rather than failing the reload.

use super::IngestError;
use crate::snapshot_store::{SalesRow, StoreStockRow, WarehouseStockRow};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::WINDOWS_1252;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

lazy_static! {
    static ref HEADER_SCRUB: Regex = Regex::new(r"[^a-z0-9_]").unwrap();
}

/// Normalizes an export header: trim, lowercase, spaces to underscores,
/// then strip everything outside `[a-z0-9_]`.
pub fn normalize_header(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase().replace(' ', "_");
    HEADER_SCRUB.replace_all(&lowered, "").into_owned()
}

/// Parsed rows of one export plus the number of rows skipped as malformed.
#[derive(Debug)]
pub struct ParsedFile<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

struct ExportReader {
    columns: HashMap<String, usize>,
    records: Vec<StringRecord>,
    file: &'static str,
}

impl ExportReader {
    /// Decodes the raw bytes as windows-1252 (a superset of the exports'
    /// latin-1) and indexes columns by normalized header name. Columns the
    /// exporter left unnamed (`Unnamed: N`) are dropped.
    fn new(bytes: &[u8], file: &'static str) -> Result<Self, IngestError> {
        let (text, _, _) = WINDOWS_1252.decode(bytes);
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut columns = HashMap::new();
        for (index, header) in reader.headers()?.iter().enumerate() {
            if header.trim().starts_with("Unnamed") {
                continue;
            }
            columns.insert(normalize_header(header), index);
        }

        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ExportReader {
            columns,
            records,
            file,
        })
    }

    fn require(&self, column: &'static str) -> Result<usize, IngestError> {
        self.columns
            .get(column)
            .copied()
            .ok_or(IngestError::MissingColumn {
                file: self.file.to_string(),
                column: column.to_string(),
            })
    }
}

fn field<'a>(record: &'a StringRecord, index: usize) -> &'a str {
    record.get(index).unwrap_or("")
}

/// Tolerant unit parse: empty is 0; `12`, `12.0` and `12,0` are all 12.
/// Anything else is a malformed row.
fn parse_units(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0);
    }
    let dotted = trimmed.replace(',', ".");
    if let Ok(value) = dotted.parse::<i64>() {
        return Some(value);
    }
    dotted.parse::<f64>().ok().map(|value| value as i64)
}

/// `DD/MM/YYYY` as exported; a trailing time of day is tolerated.
fn parse_export_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, "%d/%m/%Y").ok()
}

fn clean_barcode(raw: &str) -> Option<String> {
    let barcode = raw.trim().to_uppercase();
    if barcode.is_empty() {
        None
    } else {
        Some(barcode)
    }
}

/// `1.Ventas-Saldos.csv`: per-store stock.
pub fn parse_store_stock(bytes: &[u8]) -> Result<ParsedFile<StoreStockRow>, IngestError> {
    let reader = ExportReader::new(bytes, super::STORE_STOCK_FILE)?;
    let barcode_col = reader.require("c_barra")?;
    let brand_col = reader.require("d_marca")?;
    let color_col = reader.require("d_color_proveedor")?;
    let store_col = reader.require("d_almacen")?;
    let available_col = reader.require("saldo_disponible")?;

    let mut rows = Vec::with_capacity(reader.records.len());
    let mut skipped = 0;
    for record in &reader.records {
        let barcode = clean_barcode(field(record, barcode_col));
        let available = parse_units(field(record, available_col));
        let store_raw = field(record, store_col).trim();
        match (barcode, available) {
            (Some(barcode), Some(available)) if !store_raw.is_empty() => {
                rows.push(StoreStockRow {
                    barcode,
                    brand: field(record, brand_col).trim().to_uppercase(),
                    color: field(record, color_col).trim().to_uppercase(),
                    store_raw: store_raw.to_string(),
                    available,
                });
            }
            _ => {
                warn!("Skipping malformed store stock row: {:?}", record);
                skipped += 1;
            }
        }
    }
    Ok(ParsedFile { rows, skipped })
}

/// `2.Inventario-Bodega.csv`: warehouse stock.
pub fn parse_warehouse_stock(bytes: &[u8]) -> Result<ParsedFile<WarehouseStockRow>, IngestError> {
    let reader = ExportReader::new(bytes, super::WAREHOUSE_STOCK_FILE)?;
    let barcode_col = reader.require("c_barra")?;
    let available_col = reader.require("saldo_disponibles")?;

    let mut rows = Vec::with_capacity(reader.records.len());
    let mut skipped = 0;
    for record in &reader.records {
        match (
            clean_barcode(field(record, barcode_col)),
            parse_units(field(record, available_col)),
        ) {
            (Some(barcode), Some(available)) => {
                rows.push(WarehouseStockRow { barcode, available });
            }
            _ => {
                warn!("Skipping malformed warehouse stock row: {:?}", record);
                skipped += 1;
            }
        }
    }
    Ok(ParsedFile { rows, skipped })
}

/// `3.Ventas-Historico.csv`: sales, `units` negative for returns.
pub fn parse_sales_history(bytes: &[u8]) -> Result<ParsedFile<SalesRow>, IngestError> {
    let reader = ExportReader::new(bytes, super::SALES_HISTORY_FILE)?;
    let barcode_col = reader.require("c_barra")?;
    let brand_col = reader.require("d_marca")?;
    let store_col = reader.require("d_almacen")?;
    let units_col = reader.require("cn_venta")?;
    let date_col = reader.require("f_sistema")?;

    let mut rows = Vec::with_capacity(reader.records.len());
    let mut skipped = 0;
    for record in &reader.records {
        let barcode = clean_barcode(field(record, barcode_col));
        let units = parse_units(field(record, units_col));
        let sold_on = parse_export_date(field(record, date_col));
        let store_raw = field(record, store_col).trim();
        match (barcode, units, sold_on) {
            (Some(barcode), Some(units), Some(sold_on)) if !store_raw.is_empty() => {
                rows.push(SalesRow {
                    barcode,
                    brand: field(record, brand_col).trim().to_uppercase(),
                    store_raw: store_raw.to_string(),
                    units,
                    sold_on: sold_on.format("%Y-%m-%d").to_string(),
                });
            }
            _ => {
                warn!("Skipping malformed sales row: {:?}", record);
                skipped += 1;
            }
        }
    }
    Ok(ParsedFile { rows, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_normalization_scrubs_to_snake_case() {
        assert_eq!(normalize_header("  C Barra "), "c_barra");
        assert_eq!(normalize_header("Saldo Disponible"), "saldo_disponible");
        assert_eq!(normalize_header("D_Marca"), "d_marca");
        assert_eq!(normalize_header("F. Sistema"), "f_sistema");
    }

    #[test]
    fn units_parse_is_tolerant() {
        assert_eq!(parse_units(""), Some(0));
        assert_eq!(parse_units("  "), Some(0));
        assert_eq!(parse_units("12"), Some(12));
        assert_eq!(parse_units("12.0"), Some(12));
        assert_eq!(parse_units("12,0"), Some(12));
        assert_eq!(parse_units("-3"), Some(-3));
        assert_eq!(parse_units("n/a"), None);
    }

    #[test]
    fn export_dates_are_day_first() {
        assert_eq!(
            parse_export_date("05/03/2026"),
            NaiveDate::from_ymd_opt(2026, 3, 5)
        );
        assert_eq!(
            parse_export_date("05/03/2026 14:30"),
            NaiveDate::from_ymd_opt(2026, 3, 5)
        );
        assert_eq!(parse_export_date("2026-03-05"), None);
        assert_eq!(parse_export_date(""), None);
    }

    #[test]
    fn store_stock_parses_latin1_and_skips_bad_rows() {
        // "PEQUEÑA" with a latin-1 Ñ byte.
        let bytes: &[u8] = b"C Barra;D Marca;D Color Proveedor;D Almacen;Saldo Disponible;Unnamed: 5\n\
            abc1;Acme;Rojo;TIENDA PEQUE\xD1A;4;\n\
            abc2;Acme;Azul;TIENDA DOS;no;x\n\
            ;Acme;Azul;TIENDA DOS;2;\n";
        let parsed = parse_store_stock(bytes).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.rows[0].barcode, "ABC1");
        assert_eq!(parsed.rows[0].store_raw, "TIENDA PEQUEÑA");
        assert_eq!(parsed.rows[0].available, 4);
    }

    #[test]
    fn missing_required_column_fails_the_file() {
        let bytes: &[u8] = b"C Barra;Saldo Disponible\nabc1;4\n";
        let err = parse_store_stock(bytes).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingColumn { ref column, .. } if column == "d_marca"
        ));
    }

    #[test]
    fn warehouse_stock_keeps_duplicate_barcodes() {
        let bytes: &[u8] = b"C Barra;Saldo Disponibles\nB1;5\nb1;2,0\n";
        let parsed = parse_warehouse_stock(bytes).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].barcode, "B1");
        assert_eq!(parsed.rows[1].barcode, "B1");
        assert_eq!(parsed.rows[1].available, 2);
    }

    #[test]
    fn sales_rows_convert_dates_and_skip_bad_ones() {
        let bytes: &[u8] = b"C Barra;D Marca;D Almacen;Cn Venta;F Sistema\n\
            B1;ACME;TIENDA UNO;2;15/02/2026\n\
            B1;ACME;TIENDA UNO;1;oops\n";
        let parsed = parse_sales_history(bytes).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.rows[0].sold_on, "2026-02-15");
    }
}
