//! End-to-end tests for the full pipeline: latin-1 export files on disk,
//! a destructive reload into the snapshot database, a seeded planning
//! database, and every analytics engine plus the export backends on top.

mod common;

use common::{
    TestData, BODEGA_RAW, STORE_CENTRO_CLEAN, STORE_NORTE_CLEAN, STORE_SUR_CLEAN,
};
use jagi_analytics::analytics::restock::RestockStatus;
use jagi_analytics::analytics::{brand, coverage, redistribution, restock, stock};
use jagi_analytics::ingest::run_full_reload;
use jagi_analytics::report::{export_per_store, restock_table, write_csv, PICKING_COLUMNS};
use jagi_analytics::snapshot_store::ReloadOutcome;
use jagi_analytics::{Planning, PlanningStore, SnapshotStore, SqlitePlanningStore, SqliteSnapshotStore};

fn reloaded() -> (TestData, SqliteSnapshotStore, Planning) {
    let data = TestData::create().unwrap();
    let snapshot = SqliteSnapshotStore::new(data.snapshots_db_path()).unwrap();
    run_full_reload(&snapshot, data.data_dir()).unwrap();
    let planning = SqlitePlanningStore::new(data.planning_db_path())
        .unwrap()
        .load_planning()
        .unwrap();
    (data, snapshot, planning)
}

// =============================================================================
// Reload
// =============================================================================

#[test]
fn test_reload_populates_snapshot_and_logs_the_run() {
    let data = TestData::create().unwrap();
    let snapshot = SqliteSnapshotStore::new(data.snapshots_db_path()).unwrap();

    let stats = run_full_reload(&snapshot, data.data_dir()).unwrap();

    assert_eq!(stats.counts.store_stock, 6);
    assert_eq!(stats.counts.warehouse_stock, 3);
    assert_eq!(stats.counts.sales_history, 5);
    // The store stock row without a barcode.
    assert_eq!(stats.skipped_rows, 1);

    let counts = snapshot.table_counts().unwrap();
    assert_eq!(counts.store_stock, 6);
    assert_eq!(counts.warehouse_stock, 3);
    assert_eq!(counts.sales_history, 5);

    let runs = snapshot.reload_runs(10).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].outcome, ReloadOutcome::Completed);
    assert_eq!(runs[0].skipped_rows, 1);
}

#[test]
fn test_second_reload_replaces_everything_but_keeps_the_log() {
    let data = TestData::create().unwrap();
    let snapshot = SqliteSnapshotStore::new(data.snapshots_db_path()).unwrap();

    run_full_reload(&snapshot, data.data_dir()).unwrap();
    run_full_reload(&snapshot, data.data_dir()).unwrap();

    let counts = snapshot.table_counts().unwrap();
    assert_eq!(counts.store_stock, 6);
    assert_eq!(snapshot.reload_runs(10).unwrap().len(), 2);
}

// =============================================================================
// Restock
// =============================================================================

#[test]
fn test_restock_end_to_end() {
    let (_data, snapshot, planning) = reloaded();

    let report = restock::run(&snapshot, &planning, &restock::RestockParams::default()).unwrap();

    // B300 at TIENDA CENTRO never sold: OK, dropped. B400 is excluded.
    // The warehouse's own stock row is not a store.
    assert!(report.lines.iter().all(|l| l.barcode != "B400"));
    assert!(report
        .lines
        .iter()
        .all(|l| !l.store.to_uppercase().contains("BODEGA")));
    assert_eq!(report.lines.len(), 5);

    // B100 at TIENDA CENTRO: sold 5 in the window, available 1, default
    // minimum 4, warehouse total 6 + 4.
    let centro = report
        .lines
        .iter()
        .find(|l| l.store == STORE_CENTRO_CLEAN && l.barcode == "B100")
        .unwrap();
    assert_eq!(centro.region, "NORTE");
    assert_eq!(centro.brand, "MAÑANA");
    assert_eq!(centro.sold_in_window, 5);
    assert_eq!(centro.min_stock, 4);
    assert_eq!(centro.requested, 3);
    assert_eq!(centro.warehouse_stock, 10);
    assert_eq!(centro.assigned, 3);
    assert_eq!(centro.status, RestockStatus::Restock);

    // B200 at TIENDA NORTE sold but has no warehouse stock at all.
    let norte_b200 = report
        .lines
        .iter()
        .find(|l| l.store == STORE_NORTE_CLEAN && l.barcode == "B200")
        .unwrap();
    assert_eq!(norte_b200.requested, 4);
    assert_eq!(norte_b200.assigned, 0);
    assert_eq!(norte_b200.status, RestockStatus::Purchase);

    // B300 at TIENDA NORTE: sold 2, available 1, warehouse 5.
    let norte_b300 = report
        .lines
        .iter()
        .find(|l| l.store == STORE_NORTE_CLEAN && l.barcode == "B300")
        .unwrap();
    assert_eq!(norte_b300.requested, 3);
    assert_eq!(norte_b300.assigned, 3);
    assert_eq!(norte_b300.status, RestockStatus::Restock);

    // B100 sold 7 units at TIENDA SUR 40 days ago: expansion candidates
    // are the stores that do not carry it today.
    let expansions: Vec<_> = report
        .lines
        .iter()
        .filter(|l| l.status == RestockStatus::Expansion)
        .collect();
    assert_eq!(expansions.len(), 2);
    for line in &expansions {
        assert_eq!(line.barcode, "B100");
        assert_eq!(line.brand, "MAÑANA");
        assert_eq!(line.available, 0);
        assert_eq!(line.requested, 4);
        assert_eq!(line.assigned, 4);
    }
    let expansion_stores: Vec<&str> =
        expansions.iter().map(|l| l.store.as_str()).collect();
    assert!(expansion_stores.contains(&STORE_NORTE_CLEAN));
    assert!(expansion_stores.contains(&STORE_SUR_CLEAN));

    // Sorted by (region, store, brand, barcode).
    let mut sorted = report.lines.clone();
    sorted.sort_by(|a, b| {
        (&a.region, &a.store, &a.brand, &a.barcode).cmp(&(
            &b.region, &b.store, &b.brand, &b.barcode,
        ))
    });
    assert_eq!(
        report.lines.iter().map(|l| &l.barcode).collect::<Vec<_>>(),
        sorted.iter().map(|l| &l.barcode).collect::<Vec<_>>()
    );

    assert_eq!(report.summary.restock_rows, 2);
    assert_eq!(report.summary.purchase_rows, 1);
    assert_eq!(report.summary.expansion_rows, 2);
    assert_eq!(report.summary.new_rows, 0);
}

#[test]
fn test_restock_new_product_rows_cover_every_store() {
    let (_data, snapshot, planning) = reloaded();

    let params = restock::RestockParams {
        new_products: vec![restock::NewProduct {
            barcode: "B900".to_string(),
            brand: "NUEVA".to_string(),
            color: "BLANCO".to_string(),
        }],
        ..Default::default()
    };
    let report = restock::run(&snapshot, &planning, &params).unwrap();

    let new_rows: Vec<_> = report
        .lines
        .iter()
        .filter(|l| l.status == RestockStatus::New)
        .collect();
    assert_eq!(new_rows.len(), 3);
    for line in &new_rows {
        assert_eq!(line.barcode, "B900");
        assert_eq!(line.brand, "NUEVA");
        assert_eq!(line.requested, 4);
        // No warehouse stock for B900: new rows are force-assigned anyway.
        assert_eq!(line.assigned, 4);
        assert_eq!(line.warehouse_remaining, 0);
    }
}

// =============================================================================
// Redistribution
// =============================================================================

#[test]
fn test_redistribution_end_to_end() {
    let (_data, snapshot, planning) = reloaded();

    let lines = redistribution::run(
        &snapshot,
        &planning,
        &redistribution::RedistributionParams::default(),
    )
    .unwrap();

    // B300: TIENDA CENTRO has 8 with no sales, TIENDA NORTE has 1 with
    // sales, both in NORTE. Surplus half = 2, deficit = 3.
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].barcode, "B300");
    assert_eq!(lines[0].brand, "ACME");
    assert_eq!(lines[0].region, "NORTE");
    assert_eq!(lines[0].origin_store, STORE_CENTRO_CLEAN);
    assert_eq!(lines[0].destination_store, STORE_NORTE_CLEAN);
    assert_eq!(lines[0].suggested, 2);
}

#[test]
fn test_redistribution_unknown_source_store_is_empty() {
    let (_data, snapshot, planning) = reloaded();

    let params = redistribution::RedistributionParams {
        source_store: Some("TIENDA FANTASMA".to_string()),
        ..Default::default()
    };
    let lines = redistribution::run(&snapshot, &planning, &params).unwrap();
    assert!(lines.is_empty());
}

// =============================================================================
// Coverage
// =============================================================================

#[test]
fn test_coverage_end_to_end() {
    let (_data, snapshot, planning) = reloaded();

    let report = coverage::run(&snapshot, &planning, &coverage::CoverageParams::default()).unwrap();

    // Dormant rows are excluded by default, and the warehouse row never
    // shows up.
    assert!(report
        .lines
        .iter()
        .all(|l| !l.store.to_uppercase().contains("BODEGA")));
    assert!(report.lines.iter().all(|l| l.sold_in_window > 0));

    // B100 at TIENDA CENTRO: 5 sold over 30 days, 1 in stock, target 60
    // days. Need = ceil(5/30 * 60) - 1 = 9.
    let centro = report
        .lines
        .iter()
        .find(|l| l.store == STORE_CENTRO_CLEAN && l.barcode == "B100")
        .unwrap();
    assert_eq!(centro.need, 9);
    assert_eq!(centro.priority, coverage::CoveragePriority::High);
    let days = centro.coverage_days.unwrap();
    assert!((days - 6.0).abs() < 0.01);

    assert!(report.items_with_need >= 1);
    assert_eq!(
        report.units_needed,
        report.lines.iter().map(|l| l.need).sum::<i64>()
    );
    assert!(report
        .per_store
        .iter()
        .any(|s| s.store == STORE_CENTRO_CLEAN));
}

// =============================================================================
// Brand analysis
// =============================================================================

#[test]
fn test_brand_analysis_end_to_end() {
    let (_data, snapshot, planning) = reloaded();

    let report = brand::run(&snapshot, &planning, "mañana").unwrap();

    assert_eq!(report.brand, "MAÑANA");
    assert_eq!(report.summary.product_count, 1);
    assert_eq!(report.summary.store_count, 3);
    assert_eq!(report.summary.stores_with_top, 1);

    let b100 = &report.products[0];
    assert_eq!(b100.barcode, "B100");
    assert_eq!(b100.color, "ROJO");
    // The 40-day-old sale is outside the 30-day window.
    assert_eq!(b100.sold_30d, 5);
    assert_eq!(b100.stores_with, vec![STORE_CENTRO_CLEAN]);
    assert_eq!(b100.missing_count, 2);
    // Every stock row counts, the warehouse's own row included.
    assert_eq!(b100.total_stock, 100);

    assert!(report.recommendation.contains("1 tiendas"));
}

// =============================================================================
// Stock listings and lookups
// =============================================================================

#[test]
fn test_stock_listing_end_to_end() {
    let (_data, snapshot, planning) = reloaded();

    let lines = stock::stock_by_store(&snapshot, &planning).unwrap();
    assert_eq!(lines.len(), 6);

    // The warehouse raw name is not in the directory: raw name and
    // region fallback pass through.
    let bodega = lines.iter().find(|l| l.store == BODEGA_RAW).unwrap();
    assert_eq!(bodega.region, "SIN REGION");
    assert!(!bodega.pinned);

    let centro = lines
        .iter()
        .find(|l| l.store == STORE_CENTRO_CLEAN && l.barcode == "B100")
        .unwrap();
    assert_eq!(centro.region, "NORTE");
    assert_eq!(centro.store_type.as_deref(), Some("PROPIA"));
}

#[test]
fn test_product_lookup_end_to_end() {
    let (_data, snapshot, planning) = reloaded();

    let lookup = stock::product_lookup(&snapshot, &planning, "b100").unwrap();
    assert_eq!(lookup.barcode, "B100");
    assert_eq!(lookup.brand, "MAÑANA");
    assert_eq!(lookup.warehouse_total, 10);
    assert_eq!(lookup.sold_30d, 5);
    assert!(lookup
        .per_store
        .contains(&(STORE_CENTRO_CLEAN.to_string(), 1)));

    let missing = stock::product_lookup(&snapshot, &planning, "B999");
    assert!(missing.is_err());
}

// =============================================================================
// Exports
// =============================================================================

#[test]
fn test_csv_and_per_store_exports_end_to_end() {
    let (data, snapshot, planning) = reloaded();

    let report = restock::run(&snapshot, &planning, &restock::RestockParams::default()).unwrap();
    let table = restock_table(&report);

    let out = data.data_dir().join("reports").join("restock.csv");
    write_csv(&table, &out).unwrap();
    let content = std::fs::read_to_string(&out).unwrap();
    assert!(content.starts_with("region,store,barcode"));
    assert_eq!(content.lines().count(), table.rows.len() + 1);

    let per_store_dir = data.data_dir().join("reports").join("per-store");
    let paths = export_per_store(&table, &per_store_dir, true).unwrap();
    // One file per store with restock lines.
    assert_eq!(paths.len(), 3);
    let first = std::fs::read_to_string(&paths[0]).unwrap();
    assert!(first.starts_with(&PICKING_COLUMNS.join(",")));
}
