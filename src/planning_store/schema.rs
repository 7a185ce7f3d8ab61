//! Versioned SQLite schema for the planning database.
//!
//! v1 adds `stores.active`, mirroring a production migration: stores that
//! close are deactivated rather than deleted so their history keeps
//! resolving.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};
use anyhow::Result;
use rusqlite::Connection;

const STORES_TABLE_V0: Table = Table {
    name: "stores",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("raw_name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("clean_name", &SqlType::Text, non_null = true),
        sqlite_column!("region", &SqlType::Text, non_null = true),
        sqlite_column!("pinned", &SqlType::Integer, non_null = true, default_value = Some("0")),
        sqlite_column!("store_type", &SqlType::Text),
    ],
    indices: &[("idx_stores_clean_name", "clean_name")],
    unique_constraints: &[],
};

const STORES_TABLE: Table = Table {
    name: "stores",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("raw_name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("clean_name", &SqlType::Text, non_null = true),
        sqlite_column!("region", &SqlType::Text, non_null = true),
        sqlite_column!("pinned", &SqlType::Integer, non_null = true, default_value = Some("0")),
        sqlite_column!("store_type", &SqlType::Text),
        sqlite_column!("active", &SqlType::Integer, non_null = true, default_value = Some("1")),
    ],
    indices: &[("idx_stores_clean_name", "clean_name")],
    unique_constraints: &[],
};

const MIN_STOCK_RULES_TABLE: Table = Table {
    name: "min_stock_rules",
    columns: &[
        sqlite_column!("kind", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("quantity", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

const PINNED_BARCODES_TABLE: Table = Table {
    name: "pinned_barcodes",
    columns: &[sqlite_column!(
        "barcode",
        &SqlType::Text,
        non_null = true,
        is_unique = true
    )],
    indices: &[],
    unique_constraints: &[],
};

const MULTIBRAND_BRANDS_TABLE: Table = Table {
    name: "multibrand_brands",
    columns: &[sqlite_column!(
        "brand",
        &SqlType::Text,
        non_null = true,
        is_unique = true
    )],
    indices: &[],
    unique_constraints: &[],
};

const EXCLUDED_BARCODES_TABLE: Table = Table {
    name: "excluded_barcodes",
    columns: &[sqlite_column!(
        "barcode",
        &SqlType::Text,
        non_null = true,
        is_unique = true
    )],
    indices: &[],
    unique_constraints: &[],
};

fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    conn.execute(
        "ALTER TABLE stores ADD COLUMN active INTEGER NOT NULL DEFAULT 1",
        [],
    )?;
    conn.execute("UPDATE stores SET active = 1", [])?;
    Ok(())
}

pub const PLANNING_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[
            STORES_TABLE_V0,
            MIN_STOCK_RULES_TABLE,
            PINNED_BARCODES_TABLE,
            MULTIBRAND_BRANDS_TABLE,
            EXCLUDED_BARCODES_TABLE,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[
            STORES_TABLE,
            MIN_STOCK_RULES_TABLE,
            PINNED_BARCODES_TABLE,
            MULTIBRAND_BRANDS_TABLE,
            EXCLUDED_BARCODES_TABLE,
        ],
        migration: Some(migrate_v0_to_v1),
    },
];
