//! Current stock listings and single-product lookups.

use super::{AnalyticsError, StoreDirectory};
use crate::planning_store::Planning;
use crate::snapshot_store::SnapshotStore;
use chrono::{Duration, Utc};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct StockLine {
    pub store: String,
    pub barcode: String,
    pub brand: String,
    pub available: i64,
    pub region: String,
    pub store_type: Option<String>,
    pub pinned: bool,
}

/// Full store stock joined to the directory, ordered by store then brand.
pub fn stock_by_store(
    snapshot: &dyn SnapshotStore,
    planning: &Planning,
) -> Result<Vec<StockLine>, AnalyticsError> {
    let directory = StoreDirectory::new(planning);

    let mut lines = Vec::new();
    for row in snapshot.store_stock_rows()? {
        let entry = directory.entry_for_raw(&row.store_raw);
        lines.push(StockLine {
            store: directory.resolve(&row.store_raw),
            barcode: row.barcode,
            brand: row.brand,
            available: row.available,
            region: entry
                .map(|e| e.region.clone())
                .unwrap_or_else(|| super::NO_REGION.to_string()),
            store_type: entry.and_then(|e| e.store_type.clone()),
            pinned: entry.map(|e| e.pinned).unwrap_or(false),
        });
    }
    lines.sort_by(|a, b| {
        (&a.store, &a.brand, &a.barcode).cmp(&(&b.store, &b.brand, &b.barcode))
    });
    Ok(lines)
}

#[derive(Clone, Debug, Serialize)]
pub struct ProductLookup {
    pub barcode: String,
    pub brand: String,
    pub color: String,
    /// (store, available), stores resolved to canonical names.
    pub per_store: Vec<(String, i64)>,
    pub warehouse_total: i64,
    pub sold_30d: i64,
}

/// Everything known about one barcode. Unknown barcodes are an error.
pub fn product_lookup(
    snapshot: &dyn SnapshotStore,
    planning: &Planning,
    barcode: &str,
) -> Result<ProductLookup, AnalyticsError> {
    let directory = StoreDirectory::new(planning);
    let barcode = barcode.trim().to_uppercase();

    let stock_rows = snapshot.stock_by_barcode(&barcode)?;
    let warehouse_total = snapshot
        .warehouse_totals()?
        .get(&barcode)
        .copied()
        .unwrap_or(0);
    if stock_rows.is_empty() && warehouse_total == 0 {
        return Err(AnalyticsError::ProductNotFound(barcode));
    }

    let (brand, color) = snapshot
        .product_refs()?
        .into_iter()
        .find(|product| product.barcode == barcode)
        .map(|product| (product.brand, product.color))
        .unwrap_or_else(|| (super::NO_BRAND.to_string(), super::NO_COLOR.to_string()));

    let since = Utc::now().date_naive() - Duration::days(30);
    let sold_30d = snapshot.units_sold_for_barcode(&barcode, since)?;

    let mut per_store: Vec<(String, i64)> = stock_rows
        .into_iter()
        .map(|(store_raw, available)| (directory.resolve(&store_raw), available))
        .collect();
    per_store.sort();

    Ok(ProductLookup {
        barcode,
        brand,
        color,
        per_store,
        warehouse_total,
        sold_30d,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning_store::StoreEntry;
    use crate::snapshot_store::{
        SnapshotTables, SqliteSnapshotStore, StoreStockRow, WarehouseStockRow,
    };
    use tempfile::TempDir;

    fn snapshot_with_rows() -> (TempDir, SqliteSnapshotStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteSnapshotStore::new(dir.path().join("snapshots.db")).unwrap();
        store
            .replace_all(SnapshotTables {
                store_stock: vec![
                    StoreStockRow {
                        barcode: "B1".into(),
                        brand: "ACME".into(),
                        color: "ROJO".into(),
                        store_raw: "T1 RAW".into(),
                        available: 3,
                    },
                    StoreStockRow {
                        barcode: "B2".into(),
                        brand: "ZETA".into(),
                        color: "AZUL".into(),
                        store_raw: "MYSTERY".into(),
                        available: 1,
                    },
                ],
                warehouse_stock: vec![WarehouseStockRow {
                    barcode: "B1".into(),
                    available: 9,
                }],
                sales_history: vec![],
            })
            .unwrap();
        (dir, store)
    }

    fn planning() -> Planning {
        let mut planning = Planning::default();
        planning.stores = vec![StoreEntry {
            raw_name: "T1 RAW".into(),
            clean_name: "TIENDA UNO".into(),
            region: "NORTE".into(),
            pinned: true,
            store_type: Some("PROPIA".into()),
            active: true,
        }];
        planning
    }

    #[test]
    fn listing_joins_directory_with_fallbacks() {
        let (_dir, snapshot) = snapshot_with_rows();
        let lines = stock_by_store(&snapshot, &planning()).unwrap();

        assert_eq!(lines.len(), 2);
        let known = lines.iter().find(|l| l.barcode == "B1").unwrap();
        assert_eq!(known.store, "TIENDA UNO");
        assert_eq!(known.region, "NORTE");
        assert_eq!(known.store_type.as_deref(), Some("PROPIA"));
        assert!(known.pinned);

        let unknown = lines.iter().find(|l| l.barcode == "B2").unwrap();
        assert_eq!(unknown.store, "MYSTERY");
        assert_eq!(unknown.region, super::super::NO_REGION);
        assert!(!unknown.pinned);
    }

    #[test]
    fn lookup_resolves_and_rejects_unknown() {
        let (_dir, snapshot) = snapshot_with_rows();
        let planning = planning();

        let lookup = product_lookup(&snapshot, &planning, " b1 ").unwrap();
        assert_eq!(lookup.barcode, "B1");
        assert_eq!(lookup.brand, "ACME");
        assert_eq!(lookup.warehouse_total, 9);
        assert_eq!(lookup.sold_30d, 0);
        assert_eq!(lookup.per_store, vec![("TIENDA UNO".to_string(), 3)]);

        assert!(matches!(
            product_lookup(&snapshot, &planning, "NOPE"),
            Err(AnalyticsError::ProductNotFound(_))
        ));
    }
}
