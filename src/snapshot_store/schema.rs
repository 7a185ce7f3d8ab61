//! SQLite schema for the snapshot database.
//!
//! The three raw tables mirror the Mahalo CSV exports and are dropped and
//! recreated wholesale on every reload. Only `reload_log` is persistent and
//! therefore part of the versioned schema.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

/// Store stock, one row per (store, product) from `1.Ventas-Saldos.csv`.
pub const STORE_STOCK_TABLE: Table = Table {
    name: "store_stock",
    columns: &[
        sqlite_column!("barcode", &SqlType::Text, non_null = true),
        sqlite_column!("brand", &SqlType::Text, non_null = true),
        sqlite_column!("color", &SqlType::Text, non_null = true),
        sqlite_column!("store_raw", &SqlType::Text, non_null = true),
        sqlite_column!("available", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_store_stock_barcode", "barcode"),
        ("idx_store_stock_store", "store_raw"),
    ],
    unique_constraints: &[],
};

/// Warehouse stock from `2.Inventario-Bodega.csv`. May hold several rows
/// per barcode; readers aggregate with SUM.
pub const WAREHOUSE_STOCK_TABLE: Table = Table {
    name: "warehouse_stock",
    columns: &[
        sqlite_column!("barcode", &SqlType::Text, non_null = true),
        sqlite_column!("available", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_warehouse_stock_barcode", "barcode")],
    unique_constraints: &[],
};

/// Sales history from `3.Ventas-Historico.csv`. `sold_on` is ISO text so
/// window predicates are plain string comparisons.
pub const SALES_HISTORY_TABLE: Table = Table {
    name: "sales_history",
    columns: &[
        sqlite_column!("barcode", &SqlType::Text, non_null = true),
        sqlite_column!("brand", &SqlType::Text, non_null = true),
        sqlite_column!("store_raw", &SqlType::Text, non_null = true),
        sqlite_column!("units", &SqlType::Integer, non_null = true),
        sqlite_column!("sold_on", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_sales_history_barcode", "barcode"),
        ("idx_sales_history_sold_on", "sold_on"),
    ],
    unique_constraints: &[],
};

/// All raw tables, in reload order.
pub const RAW_TABLES: &[Table] = &[STORE_STOCK_TABLE, WAREHOUSE_STOCK_TABLE, SALES_HISTORY_TABLE];

/// Reload audit log. Not dropped by reloads.
const RELOAD_LOG_TABLE: Table = Table {
    name: "reload_log",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("started_at", &SqlType::Text, non_null = true),
        sqlite_column!("finished_at", &SqlType::Text, non_null = true),
        sqlite_column!("store_stock_rows", &SqlType::Integer, non_null = true),
        sqlite_column!("warehouse_stock_rows", &SqlType::Integer, non_null = true),
        sqlite_column!("sales_history_rows", &SqlType::Integer, non_null = true),
        sqlite_column!("skipped_rows", &SqlType::Integer, non_null = true),
        sqlite_column!("outcome", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_reload_log_started_at", "started_at")],
    unique_constraints: &[],
};

pub const SNAPSHOT_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[RELOAD_LOG_TABLE],
    migration: None,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn snapshot_schema_creates_and_validates() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = SNAPSHOT_VERSIONED_SCHEMAS.last().unwrap();
        schema.create(&conn).unwrap();
        schema.validate(&conn).unwrap();
    }

    #[test]
    fn raw_tables_survive_drop_and_recreate() {
        let conn = Connection::open_in_memory().unwrap();
        for table in RAW_TABLES {
            table.create(&conn).unwrap();
        }
        for table in RAW_TABLES {
            table.drop_if_exists(&conn).unwrap();
            table.create(&conn).unwrap();
        }
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }
}
