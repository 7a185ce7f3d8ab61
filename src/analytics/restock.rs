//! The restock suggestion engine.
//!
//! Three row families share one output shape: base rows (stock the stores
//! already carry), expansion rows (products selling well that a store does
//! not carry yet) and new-product rows (references pushed to every store).
//! Warehouse stock is allocated in two passes, each starting from the full
//! warehouse balance per barcode; the report keeps the families apart via
//! the status column.

use super::text::normalize_name;
use super::{
    dynamic_min_stock, AnalyticsError, ParamsError, StoreDirectory, NO_BRAND, NO_COLOR,
    WAREHOUSE_STORE_MARKER,
};
use crate::planning_store::{Planning, RuleKind};
use crate::snapshot_store::{SnapshotStore, StoreStockRow};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A reference to introduce everywhere, regardless of sales history.
#[derive(Clone, Debug, Serialize)]
pub struct NewProduct {
    pub barcode: String,
    pub brand: String,
    pub color: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RestockParams {
    pub sales_window_days: i64,
    pub expansion_window_days: i64,
    pub expansion_min_sales: i64,
    pub new_products: Vec<NewProduct>,
}

impl Default for RestockParams {
    fn default() -> Self {
        RestockParams {
            sales_window_days: 10,
            expansion_window_days: 60,
            expansion_min_sales: 3,
            new_products: Vec::new(),
        }
    }
}

impl RestockParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(1..=90).contains(&self.sales_window_days) {
            return Err(ParamsError::InvalidRange {
                name: "sales_window_days",
                min: 1,
                max: 90,
                value: self.sales_window_days,
            });
        }
        if !(self.sales_window_days..=180).contains(&self.expansion_window_days) {
            return Err(ParamsError::InvalidRange {
                name: "expansion_window_days",
                min: self.sales_window_days,
                max: 180,
                value: self.expansion_window_days,
            });
        }
        if self.expansion_min_sales < 0 {
            return Err(ParamsError::InvalidRange {
                name: "expansion_min_sales",
                min: 0,
                max: i64::MAX,
                value: self.expansion_min_sales,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RestockStatus {
    Ok,
    Restock,
    Purchase,
    Expansion,
    New,
}

impl RestockStatus {
    /// Spanish report literal, as the warehouse team reads it.
    pub fn as_str(&self) -> &'static str {
        match self {
            RestockStatus::Ok => "OK",
            RestockStatus::Restock => "REABASTECER",
            RestockStatus::Purchase => "COMPRA",
            RestockStatus::Expansion => "EXPANSION",
            RestockStatus::New => "NUEVO",
        }
    }

    pub fn from_report_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OK" => Some(RestockStatus::Ok),
            "REABASTECER" => Some(RestockStatus::Restock),
            "COMPRA" => Some(RestockStatus::Purchase),
            "EXPANSION" => Some(RestockStatus::Expansion),
            "NUEVO" => Some(RestockStatus::New),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RestockLine {
    pub region: String,
    pub store: String,
    pub barcode: String,
    pub brand: String,
    pub color: String,
    pub sold_in_window: i64,
    pub available: i64,
    pub warehouse_stock: i64,
    pub warehouse_remaining: i64,
    pub min_stock: i64,
    pub assigned: i64,
    pub requested: i64,
    pub status: RestockStatus,
}

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct RestockSummary {
    pub restock_rows: usize,
    pub purchase_rows: usize,
    pub expansion_rows: usize,
    pub new_rows: usize,
    pub total_assigned: i64,
    pub total_requested: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct RestockReport {
    pub lines: Vec<RestockLine>,
    pub summary: RestockSummary,
}

/// Pre-fetched snapshot data, keyed by resolved store names so the
/// compute stage never touches a database.
#[derive(Debug, Default)]
pub struct RestockInputs {
    pub stock_rows: Vec<StoreStockRow>,
    pub warehouse_totals: HashMap<String, i64>,
    /// (resolved store, barcode) -> units over the sales window.
    pub window_sales: HashMap<(String, String), i64>,
    /// (resolved store, barcode) -> units over the expansion window.
    pub expansion_sales: HashMap<(String, String), i64>,
    /// (normalized store, barcode) pairs currently carried.
    pub carried: HashSet<(String, String)>,
    /// barcode -> (brand, color) as seen in the stock export.
    pub product_info: HashMap<String, (String, String)>,
}

fn resolve_sales(
    raw: HashMap<(String, String), i64>,
    directory: &StoreDirectory,
) -> HashMap<(String, String), i64> {
    let mut resolved: HashMap<(String, String), i64> = HashMap::new();
    for ((store_raw, barcode), units) in raw {
        *resolved
            .entry((directory.resolve(&store_raw), barcode))
            .or_insert(0) += units;
    }
    resolved
}

pub fn run(
    snapshot: &dyn SnapshotStore,
    planning: &Planning,
    params: &RestockParams,
) -> Result<RestockReport, AnalyticsError> {
    params.validate()?;
    let directory = StoreDirectory::new(planning);
    let today = Utc::now().date_naive();

    let window_sales = resolve_sales(
        snapshot.sales_by_store_product(today - Duration::days(params.sales_window_days), None)?,
        &directory,
    );
    let expansion_sales = resolve_sales(
        snapshot
            .sales_by_store_product(today - Duration::days(params.expansion_window_days), None)?,
        &directory,
    );

    let carried = snapshot
        .carried_pairs()?
        .into_iter()
        .map(|(store_raw, barcode)| (normalize_name(&directory.resolve(&store_raw)), barcode))
        .collect();

    let mut product_info = HashMap::new();
    for product in snapshot.product_refs()? {
        product_info
            .entry(product.barcode)
            .or_insert((product.brand, product.color));
    }

    let inputs = RestockInputs {
        stock_rows: snapshot.store_stock_rows()?,
        warehouse_totals: snapshot.warehouse_totals()?,
        window_sales,
        expansion_sales,
        carried,
        product_info,
    };
    Ok(compute(planning, &directory, params, inputs))
}

pub fn compute(
    planning: &Planning,
    directory: &StoreDirectory,
    params: &RestockParams,
    inputs: RestockInputs,
) -> RestockReport {
    let mut lines: Vec<RestockLine> = Vec::with_capacity(inputs.stock_rows.len());
    let mut priorities: Vec<i64> = Vec::with_capacity(inputs.stock_rows.len());

    for row in &inputs.stock_rows {
        let barcode = row.barcode.trim().to_uppercase();
        if planning.excluded_barcodes.contains(&barcode) {
            continue;
        }
        let store = directory.resolve(&row.store_raw);
        if normalize_name(&store).contains(WAREHOUSE_STORE_MARKER) {
            continue;
        }

        let brand = row.brand.to_uppercase();
        let pinned_store = directory.is_pinned(&store);
        let pinned_barcode = planning.pinned_barcodes.contains(&barcode);
        let min_stock = dynamic_min_stock(
            planning,
            &barcode,
            &brand,
            if pinned_store {
                RuleKind::FixedSpecial
            } else {
                RuleKind::FixedNormal
            },
        );
        let warehouse_stock = *inputs.warehouse_totals.get(&barcode).unwrap_or(&0);
        let sold_in_window = *inputs
            .window_sales
            .get(&(store.clone(), barcode.clone()))
            .unwrap_or(&0);
        let requested = if sold_in_window > 0 || pinned_barcode {
            (min_stock - row.available).max(0)
        } else {
            0
        };

        priorities.push((pinned_store as i64) * 100 + sold_in_window);
        lines.push(RestockLine {
            region: directory.region_of(&store),
            store,
            barcode,
            brand,
            color: row.color.clone(),
            sold_in_window,
            available: row.available,
            warehouse_stock,
            warehouse_remaining: warehouse_stock,
            min_stock,
            assigned: 0,
            requested,
            status: RestockStatus::Ok,
        });
    }

    // Base allocation: per barcode, serve rows by store priority until the
    // warehouse balance runs out.
    let mut base_groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, line) in lines.iter().enumerate() {
        base_groups.entry(line.barcode.clone()).or_default().push(index);
    }
    for (barcode, indices) in &base_groups {
        let mut stock = *inputs.warehouse_totals.get(barcode).unwrap_or(&0);
        let mut ordered = indices.clone();
        ordered.sort_by_key(|&index| std::cmp::Reverse(priorities[index]));
        for index in ordered {
            if stock <= 0 {
                break;
            }
            let requested = lines[index].requested;
            if requested <= 0 {
                continue;
            }
            let assigned = requested.min(stock);
            lines[index].assigned = assigned;
            stock -= assigned;
        }
        for &index in indices {
            lines[index].warehouse_remaining = stock;
        }
    }

    for line in &mut lines {
        line.status = if line.requested == 0 {
            RestockStatus::Ok
        } else if line.assigned > 0 {
            RestockStatus::Restock
        } else {
            RestockStatus::Purchase
        };
    }

    // Expansion and new-product rows, allocated in a second pass that
    // starts again from the full warehouse balance.
    let universe: Vec<&String> = directory
        .universe()
        .iter()
        .filter(|store| !normalize_name(store).contains(WAREHOUSE_STORE_MARKER))
        .collect();

    let qualifying: BTreeSet<String> = inputs
        .expansion_sales
        .iter()
        .filter(|((_, barcode), units)| {
            **units >= params.expansion_min_sales && !planning.excluded_barcodes.contains(barcode)
        })
        .map(|((_, barcode), _)| barcode.clone())
        .collect();

    let special_start = lines.len();
    let default_min = planning.rule(RuleKind::Default);

    for barcode in &qualifying {
        let warehouse_stock = *inputs.warehouse_totals.get(barcode).unwrap_or(&0);
        let (brand, color) = inputs
            .product_info
            .get(barcode)
            .cloned()
            .unwrap_or_else(|| (NO_BRAND.to_string(), NO_COLOR.to_string()));

        for store in &universe {
            let store_norm = normalize_name(store);
            if inputs.carried.contains(&(store_norm, barcode.clone())) {
                continue;
            }
            lines.push(RestockLine {
                region: directory.region_of(store),
                store: (*store).clone(),
                barcode: barcode.clone(),
                brand: brand.clone(),
                color: color.clone(),
                sold_in_window: 0,
                available: 0,
                warehouse_stock,
                warehouse_remaining: warehouse_stock,
                min_stock: default_min,
                assigned: 0,
                requested: default_min,
                status: RestockStatus::Expansion,
            });
        }
    }

    for product in &params.new_products {
        let barcode = product.barcode.trim().to_uppercase();
        let brand = product.brand.trim().to_uppercase();
        let color = if product.color.trim().is_empty() {
            NO_COLOR.to_string()
        } else {
            product.color.clone()
        };
        let warehouse_stock = *inputs.warehouse_totals.get(&barcode).unwrap_or(&0);

        for store in &universe {
            let pinned_store = directory.is_pinned(store);
            let min_stock = dynamic_min_stock(
                planning,
                &barcode,
                &brand,
                if pinned_store {
                    RuleKind::FixedSpecial
                } else {
                    RuleKind::FixedNormal
                },
            );
            lines.push(RestockLine {
                region: directory.region_of(store),
                store: (*store).clone(),
                barcode: barcode.clone(),
                brand: brand.clone(),
                color: color.clone(),
                sold_in_window: 0,
                available: 0,
                warehouse_stock,
                warehouse_remaining: warehouse_stock,
                min_stock,
                assigned: 0,
                requested: min_stock,
                status: RestockStatus::New,
            });
        }
    }

    let mut special_groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for index in special_start..lines.len() {
        special_groups
            .entry(lines[index].barcode.clone())
            .or_default()
            .push(index);
    }
    for (barcode, indices) in &special_groups {
        let mut stock = *inputs.warehouse_totals.get(barcode).unwrap_or(&0);
        for &index in indices {
            let requested = lines[index].requested;
            if requested <= 0 {
                continue;
            }
            match lines[index].status {
                RestockStatus::Expansion => {
                    if stock > 0 {
                        let assigned = requested.min(stock);
                        lines[index].assigned = assigned;
                        stock -= assigned;
                    }
                }
                // New references ship their minimum even with the
                // warehouse empty; purchasing covers the difference.
                RestockStatus::New => {
                    if stock > 0 {
                        let assigned = requested.min(stock);
                        lines[index].assigned = assigned;
                        stock -= assigned;
                    } else {
                        lines[index].assigned = requested;
                    }
                }
                _ => {}
            }
        }
        let remaining = stock.max(0);
        for &index in indices {
            lines[index].warehouse_remaining = remaining;
        }
    }

    lines.retain(|line| line.status != RestockStatus::Ok);
    lines.sort_by(|a, b| {
        (&a.region, &a.store, &a.brand, &a.barcode)
            .cmp(&(&b.region, &b.store, &b.brand, &b.barcode))
    });

    let mut summary = RestockSummary::default();
    for line in &lines {
        match line.status {
            RestockStatus::Restock => summary.restock_rows += 1,
            RestockStatus::Purchase => summary.purchase_rows += 1,
            RestockStatus::Expansion => summary.expansion_rows += 1,
            RestockStatus::New => summary.new_rows += 1,
            RestockStatus::Ok => {}
        }
        summary.total_assigned += line.assigned;
        summary.total_requested += line.requested;
    }

    RestockReport { lines, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning_store::StoreEntry;

    fn entry(raw: &str, clean: &str, region: &str, pinned: bool) -> StoreEntry {
        StoreEntry {
            raw_name: raw.to_string(),
            clean_name: clean.to_string(),
            region: region.to_string(),
            pinned,
            store_type: None,
            active: true,
        }
    }

    fn planning() -> Planning {
        let mut planning = Planning::default();
        planning.stores = vec![
            entry("T1 RAW", "TIENDA UNO", "NORTE", true),
            entry("T2 RAW", "TIENDA DOS", "NORTE", false),
            entry("BOD RAW", "BODEGA JAGI", "CENTRO", false),
        ];
        planning
    }

    fn stock_row(barcode: &str, brand: &str, store_raw: &str, available: i64) -> StoreStockRow {
        StoreStockRow {
            barcode: barcode.to_string(),
            brand: brand.to_string(),
            color: "ROJO".to_string(),
            store_raw: store_raw.to_string(),
            available,
        }
    }

    fn directory(planning: &Planning) -> StoreDirectory {
        StoreDirectory::new(planning)
    }

    #[test]
    fn demand_needs_sales_or_a_pinned_barcode() {
        let planning = planning();
        let dir = directory(&planning);
        let inputs = RestockInputs {
            stock_rows: vec![
                stock_row("B1", "ACME", "T1 RAW", 1),
                stock_row("B2", "ACME", "T1 RAW", 0),
            ],
            warehouse_totals: HashMap::from([("B1".into(), 10), ("B2".into(), 10)]),
            window_sales: HashMap::from([(("TIENDA UNO".into(), "B1".into()), 2)]),
            ..Default::default()
        };
        let report = compute(&planning, &dir, &RestockParams::default(), inputs);

        // B1 sold, so it requests up to the default minimum of 4; B2 had
        // no movement and is dropped as OK.
        assert_eq!(report.lines.len(), 1);
        let line = &report.lines[0];
        assert_eq!(line.barcode, "B1");
        assert_eq!(line.requested, 3);
        assert_eq!(line.assigned, 3);
        assert_eq!(line.status, RestockStatus::Restock);
        assert_eq!(line.warehouse_remaining, 7);
    }

    #[test]
    fn pinned_barcode_requests_without_sales() {
        let mut planning = planning();
        planning.pinned_barcodes.insert("B1".into());
        let dir = directory(&planning);
        let inputs = RestockInputs {
            stock_rows: vec![
                stock_row("B1", "ACME", "T1 RAW", 0),
                stock_row("B1", "ACME", "T2 RAW", 0),
            ],
            warehouse_totals: HashMap::from([("B1".into(), 3)]),
            ..Default::default()
        };
        let report = compute(&planning, &dir, &RestockParams::default(), inputs);

        assert_eq!(report.lines.len(), 2);
        // Pinned store first: fixed_special (5) vs fixed_normal (5); the
        // pinned store wins the scarce stock.
        let uno = report.lines.iter().find(|l| l.store == "TIENDA UNO").unwrap();
        let dos = report.lines.iter().find(|l| l.store == "TIENDA DOS").unwrap();
        assert_eq!(uno.min_stock, 5);
        assert_eq!(uno.assigned, 3);
        assert_eq!(uno.status, RestockStatus::Restock);
        assert_eq!(dos.assigned, 0);
        assert_eq!(dos.status, RestockStatus::Purchase);
        assert_eq!(uno.warehouse_remaining, 0);
    }

    #[test]
    fn allocation_prefers_higher_sales() {
        let planning = planning();
        let dir = directory(&planning);
        let inputs = RestockInputs {
            stock_rows: vec![
                stock_row("B1", "ACME", "T2 RAW", 0),
                stock_row("B1", "ACME", "T1 RAW", 0),
            ],
            warehouse_totals: HashMap::from([("B1".into(), 5)]),
            window_sales: HashMap::from([
                (("TIENDA DOS".into(), "B1".into()), 200),
                (("TIENDA UNO".into(), "B1".into()), 1),
            ]),
            ..Default::default()
        };
        let report = compute(&planning, &dir, &RestockParams::default(), inputs);

        // TIENDA DOS outsells the pinned-store bonus (200 > 1 + 100).
        let dos = report.lines.iter().find(|l| l.store == "TIENDA DOS").unwrap();
        let uno = report.lines.iter().find(|l| l.store == "TIENDA UNO").unwrap();
        assert_eq!(dos.assigned, 4);
        assert_eq!(uno.assigned, 1);
    }

    #[test]
    fn warehouse_rows_are_dropped() {
        let planning = planning();
        let dir = directory(&planning);
        let inputs = RestockInputs {
            stock_rows: vec![stock_row("B1", "ACME", "BOD RAW", 50)],
            warehouse_totals: HashMap::from([("B1".into(), 50)]),
            window_sales: HashMap::from([(("BODEGA JAGI".into(), "B1".into()), 9)]),
            ..Default::default()
        };
        let report = compute(&planning, &dir, &RestockParams::default(), inputs);
        assert!(report.lines.is_empty());
    }

    #[test]
    fn excluded_barcodes_never_appear() {
        let mut planning = planning();
        planning.excluded_barcodes.insert("B1".into());
        let dir = directory(&planning);
        let inputs = RestockInputs {
            stock_rows: vec![stock_row("B1", "ACME", "T1 RAW", 0)],
            warehouse_totals: HashMap::from([("B1".into(), 10)]),
            window_sales: HashMap::from([(("TIENDA UNO".into(), "B1".into()), 5)]),
            expansion_sales: HashMap::from([(("TIENDA UNO".into(), "B1".into()), 5)]),
            ..Default::default()
        };
        let report = compute(&planning, &dir, &RestockParams::default(), inputs);
        assert!(report.lines.is_empty());
    }

    #[test]
    fn expansion_rows_skip_carrying_stores() {
        let planning = planning();
        let dir = directory(&planning);
        let inputs = RestockInputs {
            stock_rows: vec![stock_row("B1", "ACME", "T1 RAW", 2)],
            warehouse_totals: HashMap::from([("B1".into(), 10)]),
            expansion_sales: HashMap::from([(("TIENDA UNO".into(), "B1".into()), 4)]),
            carried: HashSet::from([("tienda uno".to_string(), "B1".to_string())]),
            product_info: HashMap::from([("B1".into(), ("ACME".into(), "ROJO".into()))]),
            ..Default::default()
        };
        let report = compute(&planning, &dir, &RestockParams::default(), inputs);

        // Base row has no sales in the short window -> OK, dropped. One
        // expansion row for the store that does not carry B1; the bodega
        // is not part of the universe.
        assert_eq!(report.lines.len(), 1);
        let line = &report.lines[0];
        assert_eq!(line.store, "TIENDA DOS");
        assert_eq!(line.status, RestockStatus::Expansion);
        assert_eq!(line.requested, 4);
        assert_eq!(line.assigned, 4);
        assert_eq!(line.warehouse_remaining, 6);
    }

    #[test]
    fn expansion_below_threshold_is_ignored() {
        let planning = planning();
        let dir = directory(&planning);
        let inputs = RestockInputs {
            expansion_sales: HashMap::from([(("TIENDA UNO".into(), "B1".into()), 2)]),
            ..Default::default()
        };
        let report = compute(&planning, &dir, &RestockParams::default(), inputs);
        assert!(report.lines.is_empty());
    }

    #[test]
    fn new_products_are_forced_when_warehouse_is_empty() {
        let planning = planning();
        let dir = directory(&planning);
        let params = RestockParams {
            new_products: vec![NewProduct {
                barcode: "n1".into(),
                brand: "ACME".into(),
                color: "".into(),
            }],
            ..Default::default()
        };
        let report = compute(&planning, &dir, &params, RestockInputs::default());

        // One row per universe store, forced to the full minimum.
        assert_eq!(report.lines.len(), 2);
        for line in &report.lines {
            assert_eq!(line.barcode, "N1");
            assert_eq!(line.color, NO_COLOR);
            assert_eq!(line.status, RestockStatus::New);
            assert_eq!(line.assigned, line.min_stock);
            assert_eq!(line.warehouse_remaining, 0);
        }
        assert_eq!(report.summary.new_rows, 2);
    }

    #[test]
    fn new_products_consume_stock_while_it_lasts() {
        let planning = planning();
        let dir = directory(&planning);
        let params = RestockParams {
            new_products: vec![NewProduct {
                barcode: "N1".into(),
                brand: "ACME".into(),
                color: "AZUL".into(),
            }],
            ..Default::default()
        };
        let inputs = RestockInputs {
            warehouse_totals: HashMap::from([("N1".into(), 6)]),
            ..Default::default()
        };
        let report = compute(&planning, &dir, &params, inputs);

        // Universe order: TIENDA UNO (min 5) then TIENDA DOS. The first
        // drains the warehouse to 1, the second is forced to 5 anyway.
        let total_assigned: i64 = report.lines.iter().map(|l| l.assigned).sum();
        assert_eq!(report.lines.len(), 2);
        let uno = report.lines.iter().find(|l| l.store == "TIENDA UNO").unwrap();
        let dos = report.lines.iter().find(|l| l.store == "TIENDA DOS").unwrap();
        assert_eq!(uno.assigned, 5);
        assert_eq!(dos.assigned, 1);
        assert_eq!(total_assigned, 6);
        assert_eq!(uno.warehouse_remaining, 0);
    }

    #[test]
    fn output_is_sorted_and_summarized() {
        let planning = planning();
        let dir = directory(&planning);
        let inputs = RestockInputs {
            stock_rows: vec![
                stock_row("B2", "ZETA", "T2 RAW", 0),
                stock_row("B1", "ACME", "T1 RAW", 0),
            ],
            warehouse_totals: HashMap::from([("B1".into(), 10), ("B2".into(), 0)]),
            window_sales: HashMap::from([
                (("TIENDA UNO".into(), "B1".into()), 1),
                (("TIENDA DOS".into(), "B2".into()), 1),
            ]),
            ..Default::default()
        };
        let report = compute(&planning, &dir, &RestockParams::default(), inputs);

        assert_eq!(report.lines.len(), 2);
        // Same region; TIENDA DOS sorts before TIENDA UNO.
        assert_eq!(report.lines[0].store, "TIENDA DOS");
        assert_eq!(report.lines[0].status, RestockStatus::Purchase);
        assert_eq!(report.lines[1].store, "TIENDA UNO");
        assert_eq!(report.lines[1].status, RestockStatus::Restock);
        assert_eq!(report.summary.restock_rows, 1);
        assert_eq!(report.summary.purchase_rows, 1);
        assert_eq!(report.summary.total_requested, 8);
        assert_eq!(report.summary.total_assigned, 4);
    }

    #[test]
    fn params_are_validated() {
        let mut params = RestockParams::default();
        params.sales_window_days = 0;
        assert!(params.validate().is_err());

        let mut params = RestockParams::default();
        params.expansion_window_days = 5; // below the sales window
        assert!(params.validate().is_err());

        let mut params = RestockParams::default();
        params.expansion_min_sales = -1;
        assert!(params.validate().is_err());

        assert!(RestockParams::default().validate().is_ok());
    }
}
