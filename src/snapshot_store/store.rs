//! SQLite-backed snapshot store.
//!
//! Holds the raw Mahalo export tables and the reload audit log. Writes go
//! through a single connection behind a mutex; reads are served by a small
//! pool of read-only connections handed out round-robin.

use super::models::*;
use super::schema::{RAW_TABLES, SNAPSHOT_VERSIONED_SCHEMAS};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::info;

const READ_POOL_SIZE: usize = 4;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Read/write access to the snapshot database.
pub trait SnapshotStore: Send + Sync {
    /// Transactionally drop and recreate the raw tables and bulk-insert the
    /// parsed rows. The database keeps its previous raw tables if anything
    /// fails before commit.
    fn replace_all(&self, tables: SnapshotTables) -> Result<ReloadCounts, SnapshotError>;

    fn record_reload(&self, run: &ReloadRun) -> Result<i64, SnapshotError>;

    /// Most recent reload runs, newest first.
    fn reload_runs(&self, limit: usize) -> Result<Vec<ReloadRun>, SnapshotError>;

    fn table_counts(&self) -> Result<TableCounts, SnapshotError>;

    fn store_stock_rows(&self) -> Result<Vec<StoreStockRow>, SnapshotError>;

    /// Warehouse units per barcode, summed over all warehouse rows.
    fn warehouse_totals(&self) -> Result<HashMap<String, i64>, SnapshotError>;

    /// Units sold per (raw store, barcode) between `since` and `until`
    /// (inclusive; open-ended when `until` is None).
    fn sales_by_store_product(
        &self,
        since: NaiveDate,
        until: Option<NaiveDate>,
    ) -> Result<HashMap<(String, String), i64>, SnapshotError>;

    /// Units sold per (raw store, barcode, brand) since `since`.
    fn sales_by_store_product_brand(&self, since: NaiveDate) -> Result<Vec<SalesAgg>, SnapshotError>;

    /// Distinct (barcode, brand, color) references seen in store stock.
    fn product_refs(&self) -> Result<Vec<ProductRef>, SnapshotError>;

    /// Distinct (raw store, barcode) pairs currently carried.
    fn carried_pairs(&self) -> Result<HashSet<(String, String)>, SnapshotError>;

    /// Top products of a brand (substring match, case-insensitive) by units
    /// sold since `since`.
    fn brand_top_sellers(
        &self,
        brand_fragment: &str,
        since: NaiveDate,
        limit: usize,
    ) -> Result<Vec<BrandSeller>, SnapshotError>;

    /// Up to `limit` products of a brand, regardless of sales.
    fn brand_products_without_sales(
        &self,
        brand_fragment: &str,
        limit: usize,
    ) -> Result<Vec<ProductRef>, SnapshotError>;

    /// Per raw store stock for one barcode.
    fn stock_by_barcode(&self, barcode: &str) -> Result<Vec<(String, i64)>, SnapshotError>;

    fn units_sold_for_barcode(&self, barcode: &str, since: NaiveDate)
        -> Result<i64, SnapshotError>;
}

#[derive(Clone)]
pub struct SqliteSnapshotStore {
    write_conn: Arc<Mutex<Connection>>,
    read_pool: Vec<Arc<Mutex<Connection>>>,
    read_index: Arc<AtomicUsize>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let latest_schema = SNAPSHOT_VERSIONED_SCHEMAS.last().unwrap();

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!(
            "Creating snapshot db schema at version {}",
            latest_schema.version
        );
        latest_schema.create(conn)?;
        return Ok(());
    }

    let raw_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    let db_version = raw_version - BASE_DB_VERSION as i64;
    if db_version < 0 {
        anyhow::bail!("Snapshot database version {} is too old", raw_version);
    }
    if db_version as usize > latest_schema.version {
        anyhow::bail!("Snapshot database version {} is too new", db_version);
    }

    let mut current_version = db_version as usize;
    let tx = conn.transaction()?;
    for schema in SNAPSHOT_VERSIONED_SCHEMAS
        .iter()
        .skip(current_version + 1)
    {
        if let Some(migration_fn) = schema.migration {
            info!(
                "Migrating snapshot db from version {} to {}",
                current_version, schema.version
            );
            migration_fn(&tx)?;
            current_version = schema.version;
        }
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
    tx.commit()?;

    SNAPSHOT_VERSIONED_SCHEMAS[current_version].validate(conn)?;
    Ok(())
}

/// Creates any raw table that does not exist yet, so queries work on a
/// database that has never been reloaded.
fn ensure_raw_tables(conn: &Connection) -> Result<()> {
    for table in RAW_TABLES {
        let exists: bool = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1",
                params![table.name],
                |_| Ok(true),
            )
            .unwrap_or(false);
        if !exists {
            table.create(conn)?;
        }
    }
    Ok(())
}

impl SqliteSnapshotStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open snapshot database")?;

        migrate_if_needed(&mut write_conn)?;
        ensure_raw_tables(&write_conn)?;

        write_conn.pragma_update(None, "journal_mode", "WAL")?;

        let mut read_pool = Vec::with_capacity(READ_POOL_SIZE);
        for _ in 0..READ_POOL_SIZE {
            let read_conn = Connection::open_with_flags(
                db_path_ref,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_conn.pragma_update(None, "journal_mode", "WAL")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteSnapshotStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }
}

fn like_fragment(brand_fragment: &str) -> String {
    format!("%{}%", brand_fragment.trim().to_uppercase())
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn row_to_reload_run(row: &rusqlite::Row) -> rusqlite::Result<ReloadRun> {
    let started_at: String = row.get("started_at")?;
    let finished_at: String = row.get("finished_at")?;
    let outcome: String = row.get("outcome")?;
    Ok(ReloadRun {
        id: row.get("id")?,
        started_at: DateTime::parse_from_rfc3339(&started_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        finished_at: DateTime::parse_from_rfc3339(&finished_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        counts: ReloadCounts {
            store_stock: row.get::<_, i64>("store_stock_rows")? as usize,
            warehouse_stock: row.get::<_, i64>("warehouse_stock_rows")? as usize,
            sales_history: row.get::<_, i64>("sales_history_rows")? as usize,
        },
        skipped_rows: row.get::<_, i64>("skipped_rows")? as usize,
        outcome: ReloadOutcome::from_db_str(&outcome),
    })
}

impl SnapshotStore for SqliteSnapshotStore {
    fn replace_all(&self, tables: SnapshotTables) -> Result<ReloadCounts, SnapshotError> {
        let mut conn = self.write_conn.lock().unwrap();
        let tx = conn.transaction()?;

        for table in RAW_TABLES {
            table.drop_if_exists(&tx)?;
            table.create(&tx)?;
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO store_stock (barcode, brand, color, store_raw, available)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in &tables.store_stock {
                stmt.execute(params![
                    row.barcode,
                    row.brand,
                    row.color,
                    row.store_raw,
                    row.available
                ])?;
            }

            let mut stmt =
                tx.prepare("INSERT INTO warehouse_stock (barcode, available) VALUES (?1, ?2)")?;
            for row in &tables.warehouse_stock {
                stmt.execute(params![row.barcode, row.available])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO sales_history (barcode, brand, store_raw, units, sold_on)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in &tables.sales_history {
                stmt.execute(params![
                    row.barcode,
                    row.brand,
                    row.store_raw,
                    row.units,
                    row.sold_on
                ])?;
            }
        }

        tx.commit()?;

        Ok(ReloadCounts {
            store_stock: tables.store_stock.len(),
            warehouse_stock: tables.warehouse_stock.len(),
            sales_history: tables.sales_history.len(),
        })
    }

    fn record_reload(&self, run: &ReloadRun) -> Result<i64, SnapshotError> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO reload_log
                (started_at, finished_at, store_stock_rows, warehouse_stock_rows,
                 sales_history_rows, skipped_rows, outcome)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run.started_at.to_rfc3339(),
                run.finished_at.to_rfc3339(),
                run.counts.store_stock as i64,
                run.counts.warehouse_stock as i64,
                run.counts.sales_history as i64,
                run.skipped_rows as i64,
                run.outcome.to_db_str(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn reload_runs(&self, limit: usize) -> Result<Vec<ReloadRun>, SnapshotError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT id, started_at, finished_at, store_stock_rows, warehouse_stock_rows,
                    sales_history_rows, skipped_rows, outcome
             FROM reload_log ORDER BY started_at DESC LIMIT ?1",
        )?;
        let runs = stmt
            .query_map(params![limit as i64], row_to_reload_run)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }

    fn table_counts(&self) -> Result<TableCounts, SnapshotError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let count = |table: &str| -> Result<i64, rusqlite::Error> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        };
        Ok(TableCounts {
            store_stock: count("store_stock")?,
            warehouse_stock: count("warehouse_stock")?,
            sales_history: count("sales_history")?,
        })
    }

    fn store_stock_rows(&self) -> Result<Vec<StoreStockRow>, SnapshotError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT barcode, brand, color, store_raw, available FROM store_stock",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StoreStockRow {
                    barcode: row.get(0)?,
                    brand: row.get(1)?,
                    color: row.get(2)?,
                    store_raw: row.get(3)?,
                    available: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn warehouse_totals(&self) -> Result<HashMap<String, i64>, SnapshotError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT barcode, SUM(available) FROM warehouse_stock GROUP BY barcode",
        )?;
        let mut totals = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (barcode, total) = row?;
            totals.insert(barcode, total);
        }
        Ok(totals)
    }

    fn sales_by_store_product(
        &self,
        since: NaiveDate,
        until: Option<NaiveDate>,
    ) -> Result<HashMap<(String, String), i64>, SnapshotError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let until = until.map(iso).unwrap_or_else(|| "9999-12-31".to_string());
        let mut stmt = conn.prepare_cached(
            "SELECT store_raw, barcode, SUM(units) FROM sales_history
             WHERE sold_on >= ?1 AND sold_on <= ?2
             GROUP BY store_raw, barcode",
        )?;
        let mut sales = HashMap::new();
        let rows = stmt.query_map(params![iso(since), until], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        for row in rows {
            let (store_raw, barcode, units) = row?;
            sales.insert((store_raw, barcode), units);
        }
        Ok(sales)
    }

    fn sales_by_store_product_brand(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<SalesAgg>, SnapshotError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT store_raw, barcode, brand, SUM(units) FROM sales_history
             WHERE sold_on >= ?1
             GROUP BY store_raw, barcode, brand",
        )?;
        let rows = stmt
            .query_map(params![iso(since)], |row| {
                Ok(SalesAgg {
                    store_raw: row.get(0)?,
                    barcode: row.get(1)?,
                    brand: row.get(2)?,
                    units: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn product_refs(&self) -> Result<Vec<ProductRef>, SnapshotError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt =
            conn.prepare_cached("SELECT DISTINCT barcode, brand, color FROM store_stock")?;
        let refs = stmt
            .query_map([], |row| {
                Ok(ProductRef {
                    barcode: row.get(0)?,
                    brand: row.get(1)?,
                    color: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(refs)
    }

    fn carried_pairs(&self) -> Result<HashSet<(String, String)>, SnapshotError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT DISTINCT store_raw, barcode FROM store_stock")?;
        let mut pairs = HashSet::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            pairs.insert(row?);
        }
        Ok(pairs)
    }

    fn brand_top_sellers(
        &self,
        brand_fragment: &str,
        since: NaiveDate,
        limit: usize,
    ) -> Result<Vec<BrandSeller>, SnapshotError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT s.barcode, s.brand, s.color, SUM(h.units) AS units
             FROM store_stock s
             INNER JOIN sales_history h ON s.barcode = h.barcode
             WHERE UPPER(s.brand) LIKE ?1 AND h.sold_on >= ?2
             GROUP BY s.barcode, s.brand, s.color
             ORDER BY units DESC
             LIMIT ?3",
        )?;
        let sellers = stmt
            .query_map(
                params![like_fragment(brand_fragment), iso(since), limit as i64],
                |row| {
                    Ok(BrandSeller {
                        barcode: row.get(0)?,
                        brand: row.get(1)?,
                        color: row.get::<_, Option<String>>(2)?,
                        units: row.get(3)?,
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sellers)
    }

    fn brand_products_without_sales(
        &self,
        brand_fragment: &str,
        limit: usize,
    ) -> Result<Vec<ProductRef>, SnapshotError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT DISTINCT barcode, brand, color FROM store_stock
             WHERE UPPER(brand) LIKE ?1
             LIMIT ?2",
        )?;
        let refs = stmt
            .query_map(params![like_fragment(brand_fragment), limit as i64], |row| {
                Ok(ProductRef {
                    barcode: row.get(0)?,
                    brand: row.get(1)?,
                    color: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(refs)
    }

    fn stock_by_barcode(&self, barcode: &str) -> Result<Vec<(String, i64)>, SnapshotError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn
            .prepare_cached("SELECT store_raw, available FROM store_stock WHERE barcode = ?1")?;
        let rows = stmt
            .query_map(params![barcode], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn units_sold_for_barcode(
        &self,
        barcode: &str,
        since: NaiveDate,
    ) -> Result<i64, SnapshotError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let units: Option<i64> = conn.query_row(
            "SELECT SUM(units) FROM sales_history WHERE barcode = ?1 AND sold_on >= ?2",
            params![barcode, iso(since)],
            |r| r.get(0),
        )?;
        Ok(units.unwrap_or(0))
    }
}
