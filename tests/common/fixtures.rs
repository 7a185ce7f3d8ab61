//! Test fixture creation for the export files and the planning database.
//!
//! The CSV files are written in latin-1 with `;` separators, exactly the
//! way the Mahalo ERP exports them, including an accented brand name and
//! a malformed row.

use anyhow::Result;
use chrono::{Duration, Utc};
use jagi_analytics::ingest::{SALES_HISTORY_FILE, STORE_STOCK_FILE, WAREHOUSE_STOCK_FILE};
use jagi_analytics::planning_store::StoreEntry;
use jagi_analytics::{PlanningStore, SqlitePlanningStore};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const STORE_CENTRO_RAW: &str = "JAGI T1 CENTRO";
pub const STORE_CENTRO_CLEAN: &str = "TIENDA CENTRO";
pub const STORE_NORTE_RAW: &str = "JAGI T2 NORTE";
pub const STORE_NORTE_CLEAN: &str = "TIENDA NORTE";
pub const STORE_SUR_RAW: &str = "JAGI T3 SUR";
pub const STORE_SUR_CLEAN: &str = "TIENDA SUR";
pub const BODEGA_RAW: &str = "BODEGA JAGI CENTRAL";

/// Encodes a string as latin-1. Every character used by the fixtures is
/// below U+0100, where latin-1 and Unicode code points coincide.
pub fn latin1(s: &str) -> Vec<u8> {
    s.chars().map(|c| c as u8).collect()
}

fn days_ago(days: i64) -> String {
    (Utc::now().date_naive() - Duration::days(days))
        .format("%d/%m/%Y")
        .to_string()
}

/// A temporary data directory holding the three export files and a seeded
/// planning database.
pub struct TestData {
    pub dir: TempDir,
}

impl TestData {
    pub fn create() -> Result<Self> {
        let dir = TempDir::new()?;
        write_export_files(dir.path())?;
        seed_planning(&dir.path().join("planning.db"))?;
        Ok(TestData { dir })
    }

    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn snapshots_db_path(&self) -> PathBuf {
        self.dir.path().join("snapshots.db")
    }

    pub fn planning_db_path(&self) -> PathBuf {
        self.dir.path().join("planning.db")
    }
}

/// Writes the three Mahalo export files.
///
/// The store stock includes a row for the central warehouse (which the
/// analytics must not treat as a store) and a row without a barcode
/// (which ingestion must skip). The sales history includes a 40-day-old
/// sale that only the expansion window sees.
pub fn write_export_files(dir: &Path) -> Result<()> {
    let store_stock = format!(
        "C_Barra;D_Marca;D_Color_Proveedor;D_Almacen;Saldo_Disponible\n\
         B100;MA\u{d1}ANA;ROJO;{centro};1\n\
         B300;ACME;VERDE;{centro};8\n\
         B200;ZETA;AZUL;{norte};0\n\
         B300;ACME;VERDE;{norte};1\n\
         B400;ACME;NEGRO;{norte};0\n\
         B100;MA\u{d1}ANA;ROJO;{bodega};99\n\
         ;ZETA;AZUL;{norte};1\n",
        centro = STORE_CENTRO_RAW,
        norte = STORE_NORTE_RAW,
        bodega = BODEGA_RAW,
    );
    fs::write(dir.join(STORE_STOCK_FILE), latin1(&store_stock))?;

    let warehouse_stock = "C_Barra;Saldo_Disponibles\n\
                           B100;6\n\
                           B100;4\n\
                           B300;5\n";
    fs::write(dir.join(WAREHOUSE_STOCK_FILE), latin1(warehouse_stock))?;

    let sales_history = format!(
        "C_Barra;D_Marca;D_Almacen;Cn_Venta;F_Sistema\n\
         B100;MA\u{d1}ANA;{centro};5;{d3}\n\
         B200;ZETA;{norte};2;{d5}\n\
         B300;ACME;{norte};2;{d4}\n\
         B400;ACME;{norte};3;{d2}\n\
         B100;MA\u{d1}ANA;{sur};7;{d40}\n",
        centro = STORE_CENTRO_RAW,
        norte = STORE_NORTE_RAW,
        sur = STORE_SUR_RAW,
        d2 = days_ago(2),
        d3 = days_ago(3),
        d4 = days_ago(4),
        d5 = days_ago(5),
        d40 = days_ago(40),
    );
    fs::write(dir.join(SALES_HISTORY_FILE), latin1(&sales_history))?;

    Ok(())
}

/// Seeds the planning database: three stores in two regions, the default
/// minimum-stock rules, and one excluded barcode.
pub fn seed_planning(db_path: &Path) -> Result<()> {
    let store = SqlitePlanningStore::new(db_path)?;

    let entry = |raw: &str, clean: &str, region: &str| StoreEntry {
        raw_name: raw.to_string(),
        clean_name: clean.to_string(),
        region: region.to_string(),
        pinned: false,
        store_type: Some("PROPIA".to_string()),
        active: true,
    };
    store.upsert_store(&entry(STORE_CENTRO_RAW, STORE_CENTRO_CLEAN, "NORTE"))?;
    store.upsert_store(&entry(STORE_NORTE_RAW, STORE_NORTE_CLEAN, "NORTE"))?;
    store.upsert_store(&entry(STORE_SUR_RAW, STORE_SUR_CLEAN, "SUR"))?;

    store.seed_default_rules()?;
    store.add_excluded_barcode("B400")?;

    Ok(())
}
