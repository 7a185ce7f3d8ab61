//! SQLite-backed planning store.

use super::models::{Planning, RuleKind, StoreEntry};
use super::schema::PLANNING_VERSIONED_SCHEMAS;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::info;

const READ_POOL_SIZE: usize = 2;

#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("unknown store: {0}")]
    UnknownStore(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Access to the durable planning configuration.
pub trait PlanningStore: Send + Sync {
    /// Inserts or updates a directory entry, keyed by raw ERP name.
    fn upsert_store(&self, entry: &StoreEntry) -> Result<(), PlanningError>;
    fn set_store_region(&self, raw_name: &str, region: &str) -> Result<(), PlanningError>;
    fn set_store_pinned(&self, raw_name: &str, pinned: bool) -> Result<(), PlanningError>;
    fn set_store_active(&self, raw_name: &str, active: bool) -> Result<(), PlanningError>;
    fn remove_store(&self, raw_name: &str) -> Result<(), PlanningError>;
    fn stores(&self) -> Result<Vec<StoreEntry>, PlanningError>;

    fn set_rule(&self, kind: RuleKind, quantity: i64) -> Result<(), PlanningError>;
    fn unset_rule(&self, kind: RuleKind) -> Result<bool, PlanningError>;
    fn rules(&self) -> Result<HashMap<RuleKind, i64>, PlanningError>;
    /// Inserts a rule row for every kind that has none, at its built-in
    /// fallback quantity. Existing rows are left alone.
    fn seed_default_rules(&self) -> Result<(), PlanningError>;

    fn add_pinned_barcode(&self, barcode: &str) -> Result<(), PlanningError>;
    fn remove_pinned_barcode(&self, barcode: &str) -> Result<bool, PlanningError>;
    fn pinned_barcodes(&self) -> Result<Vec<String>, PlanningError>;

    fn add_multibrand_brand(&self, brand: &str) -> Result<(), PlanningError>;
    fn remove_multibrand_brand(&self, brand: &str) -> Result<bool, PlanningError>;
    fn multibrand_brands(&self) -> Result<Vec<String>, PlanningError>;

    fn add_excluded_barcode(&self, barcode: &str) -> Result<(), PlanningError>;
    fn remove_excluded_barcode(&self, barcode: &str) -> Result<bool, PlanningError>;
    fn excluded_barcodes(&self) -> Result<Vec<String>, PlanningError>;

    /// One-shot snapshot of everything the analytics engines consume.
    fn load_planning(&self) -> Result<Planning, PlanningError>;
}

#[derive(Clone)]
pub struct SqlitePlanningStore {
    write_conn: Arc<Mutex<Connection>>,
    read_pool: Vec<Arc<Mutex<Connection>>>,
    read_index: Arc<AtomicUsize>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let latest_schema = PLANNING_VERSIONED_SCHEMAS.last().unwrap();

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!(
            "Creating planning db schema at version {}",
            latest_schema.version
        );
        latest_schema.create(conn)?;
        return Ok(());
    }

    let raw_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    let db_version = raw_version - BASE_DB_VERSION as i64;
    if db_version < 0 {
        anyhow::bail!("Planning database version {} is too old", raw_version);
    }
    if db_version as usize > latest_schema.version {
        anyhow::bail!("Planning database version {} is too new", db_version);
    }

    let mut current_version = db_version as usize;
    let tx = conn.transaction()?;
    for schema in PLANNING_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!(
                "Migrating planning db from version {} to {}",
                current_version, schema.version
            );
            migration_fn(&tx)?;
            current_version = schema.version;
        }
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
    tx.commit()?;

    PLANNING_VERSIONED_SCHEMAS[current_version].validate(conn)?;
    Ok(())
}

fn row_to_store_entry(row: &rusqlite::Row) -> rusqlite::Result<StoreEntry> {
    Ok(StoreEntry {
        raw_name: row.get("raw_name")?,
        clean_name: row.get("clean_name")?,
        region: row.get("region")?,
        pinned: row.get::<_, i64>("pinned")? != 0,
        store_type: row.get("store_type")?,
        active: row.get::<_, i64>("active")? != 0,
    })
}

fn canon(value: &str) -> String {
    value.trim().to_uppercase()
}

impl SqlitePlanningStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open planning database")?;

        migrate_if_needed(&mut write_conn)?;
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

        Ok(SqlitePlanningStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn update_store_field(
        &self,
        raw_name: &str,
        sql: &str,
        value: &dyn rusqlite::ToSql,
    ) -> Result<(), PlanningError> {
        let conn = self.write_conn.lock().unwrap();
        let updated = conn.execute(sql, params![value, raw_name])?;
        if updated == 0 {
            return Err(PlanningError::UnknownStore(raw_name.to_string()));
        }
        Ok(())
    }

    fn string_column(&self, sql: &str) -> Result<Vec<String>, PlanningError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(sql)?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(values)
    }

    fn insert_canon(&self, sql: &str, value: &str) -> Result<(), PlanningError> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(sql, params![canon(value)])?;
        Ok(())
    }

    fn delete_canon(&self, sql: &str, value: &str) -> Result<bool, PlanningError> {
        let conn = self.write_conn.lock().unwrap();
        Ok(conn.execute(sql, params![canon(value)])? > 0)
    }
}

impl PlanningStore for SqlitePlanningStore {
    fn upsert_store(&self, entry: &StoreEntry) -> Result<(), PlanningError> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO stores (raw_name, clean_name, region, pinned, store_type, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(raw_name) DO UPDATE SET
                clean_name = excluded.clean_name,
                region = excluded.region,
                pinned = excluded.pinned,
                store_type = excluded.store_type,
                active = excluded.active",
            params![
                entry.raw_name.trim(),
                entry.clean_name.trim(),
                entry.region.trim(),
                entry.pinned as i64,
                entry.store_type,
                entry.active as i64,
            ],
        )?;
        Ok(())
    }

    fn set_store_region(&self, raw_name: &str, region: &str) -> Result<(), PlanningError> {
        self.update_store_field(
            raw_name,
            "UPDATE stores SET region = ?1 WHERE raw_name = ?2",
            &region.trim(),
        )
    }

    fn set_store_pinned(&self, raw_name: &str, pinned: bool) -> Result<(), PlanningError> {
        self.update_store_field(
            raw_name,
            "UPDATE stores SET pinned = ?1 WHERE raw_name = ?2",
            &(pinned as i64),
        )
    }

    fn set_store_active(&self, raw_name: &str, active: bool) -> Result<(), PlanningError> {
        self.update_store_field(
            raw_name,
            "UPDATE stores SET active = ?1 WHERE raw_name = ?2",
            &(active as i64),
        )
    }

    fn remove_store(&self, raw_name: &str) -> Result<(), PlanningError> {
        let conn = self.write_conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM stores WHERE raw_name = ?1", params![raw_name])?;
        if deleted == 0 {
            return Err(PlanningError::UnknownStore(raw_name.to_string()));
        }
        Ok(())
    }

    fn stores(&self) -> Result<Vec<StoreEntry>, PlanningError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT raw_name, clean_name, region, pinned, store_type, active
             FROM stores ORDER BY clean_name",
        )?;
        let entries = stmt
            .query_map([], row_to_store_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn set_rule(&self, kind: RuleKind, quantity: i64) -> Result<(), PlanningError> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO min_stock_rules (kind, quantity) VALUES (?1, ?2)
             ON CONFLICT(kind) DO UPDATE SET quantity = excluded.quantity",
            params![kind.to_db_str(), quantity],
        )?;
        Ok(())
    }

    fn unset_rule(&self, kind: RuleKind) -> Result<bool, PlanningError> {
        let conn = self.write_conn.lock().unwrap();
        Ok(conn.execute(
            "DELETE FROM min_stock_rules WHERE kind = ?1",
            params![kind.to_db_str()],
        )? > 0)
    }

    fn rules(&self) -> Result<HashMap<RuleKind, i64>, PlanningError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT kind, quantity FROM min_stock_rules")?;
        let mut rules = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (kind, quantity) = row?;
            // Rows with an unrecognized kind are ignored rather than fatal.
            if let Some(kind) = RuleKind::from_db_str(&kind) {
                rules.insert(kind, quantity);
            }
        }
        Ok(rules)
    }

    fn seed_default_rules(&self) -> Result<(), PlanningError> {
        let conn = self.write_conn.lock().unwrap();
        for kind in RuleKind::ALL {
            conn.execute(
                "INSERT OR IGNORE INTO min_stock_rules (kind, quantity) VALUES (?1, ?2)",
                params![kind.to_db_str(), kind.fallback_quantity()],
            )?;
        }
        Ok(())
    }

    fn add_pinned_barcode(&self, barcode: &str) -> Result<(), PlanningError> {
        self.insert_canon(
            "INSERT OR IGNORE INTO pinned_barcodes (barcode) VALUES (?1)",
            barcode,
        )
    }

    fn remove_pinned_barcode(&self, barcode: &str) -> Result<bool, PlanningError> {
        self.delete_canon("DELETE FROM pinned_barcodes WHERE barcode = ?1", barcode)
    }

    fn pinned_barcodes(&self) -> Result<Vec<String>, PlanningError> {
        self.string_column("SELECT barcode FROM pinned_barcodes ORDER BY barcode")
    }

    fn add_multibrand_brand(&self, brand: &str) -> Result<(), PlanningError> {
        self.insert_canon(
            "INSERT OR IGNORE INTO multibrand_brands (brand) VALUES (?1)",
            brand,
        )
    }

    fn remove_multibrand_brand(&self, brand: &str) -> Result<bool, PlanningError> {
        self.delete_canon("DELETE FROM multibrand_brands WHERE brand = ?1", brand)
    }

    fn multibrand_brands(&self) -> Result<Vec<String>, PlanningError> {
        self.string_column("SELECT brand FROM multibrand_brands ORDER BY brand")
    }

    fn add_excluded_barcode(&self, barcode: &str) -> Result<(), PlanningError> {
        self.insert_canon(
            "INSERT OR IGNORE INTO excluded_barcodes (barcode) VALUES (?1)",
            barcode,
        )
    }

    fn remove_excluded_barcode(&self, barcode: &str) -> Result<bool, PlanningError> {
        self.delete_canon("DELETE FROM excluded_barcodes WHERE barcode = ?1", barcode)
    }

    fn excluded_barcodes(&self) -> Result<Vec<String>, PlanningError> {
        self.string_column("SELECT barcode FROM excluded_barcodes ORDER BY barcode")
    }

    fn load_planning(&self) -> Result<Planning, PlanningError> {
        Ok(Planning {
            stores: self.stores()?,
            rules: self.rules()?,
            pinned_barcodes: self.pinned_barcodes()?.into_iter().collect::<HashSet<_>>(),
            multibrand_brands: self
                .multibrand_brands()?
                .into_iter()
                .collect::<HashSet<_>>(),
            excluded_barcodes: self
                .excluded_barcodes()?
                .into_iter()
                .collect::<HashSet<_>>(),
        })
    }
}
