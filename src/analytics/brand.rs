//! Brand analysis: where a brand's best sellers are, and where they are
//! missing.

use super::{AnalyticsError, StoreDirectory};
use crate::planning_store::Planning;
use crate::snapshot_store::{BrandSeller, SnapshotStore};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

const TOP_LIMIT: usize = 10;
const SALES_WINDOW_DAYS: i64 = 30;

#[derive(Clone, Debug, Serialize)]
pub struct BrandProductLine {
    pub barcode: String,
    pub brand: String,
    pub color: String,
    pub sold_30d: i64,
    pub stores_with: Vec<String>,
    pub stores_without: Vec<String>,
    pub total_stock: i64,
    /// Stores missing the product: the redistribution potential.
    pub missing_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct BrandStoreLine {
    pub store: String,
    pub region: String,
    pub top_products_present: usize,
    pub top_products_missing: usize,
    pub sales_of_present: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct BrandSummary {
    pub product_count: usize,
    pub store_count: usize,
    pub stores_with_top: usize,
    pub redistribution_opportunities: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct BrandReport {
    pub brand: String,
    pub summary: BrandSummary,
    pub products: Vec<BrandProductLine>,
    pub stores: Vec<BrandStoreLine>,
    pub recommendation: String,
}

/// Pre-fetched data for one brand analysis.
#[derive(Debug, Default)]
pub struct BrandInputs {
    /// Top sellers over the last 30 days; zero-sales fallback products
    /// carry `units == 0`.
    pub top_sellers: Vec<BrandSeller>,
    /// barcode -> (raw store name, available) rows.
    pub stock_by_barcode: HashMap<String, Vec<(String, i64)>>,
}

pub fn run(
    snapshot: &dyn SnapshotStore,
    planning: &Planning,
    brand: &str,
) -> Result<BrandReport, AnalyticsError> {
    let directory = StoreDirectory::new(planning);
    let since = Utc::now().date_naive() - Duration::days(SALES_WINDOW_DAYS);

    let mut top_sellers = snapshot.brand_top_sellers(brand, since, TOP_LIMIT)?;
    if top_sellers.is_empty() {
        top_sellers = snapshot
            .brand_products_without_sales(brand, TOP_LIMIT)?
            .into_iter()
            .map(|product| BrandSeller {
                barcode: product.barcode,
                brand: product.brand,
                color: Some(product.color),
                units: 0,
            })
            .collect();
    }

    let mut stock_by_barcode = HashMap::new();
    for seller in &top_sellers {
        stock_by_barcode.insert(
            seller.barcode.clone(),
            snapshot.stock_by_barcode(&seller.barcode)?,
        );
    }

    Ok(compute(
        &directory,
        brand,
        BrandInputs {
            top_sellers,
            stock_by_barcode,
        },
    ))
}

/// Store universe for brand analysis: directory entries that are not the
/// warehouse itself.
fn store_universe(directory: &StoreDirectory) -> Vec<String> {
    directory
        .universe()
        .iter()
        .filter(|store| !store.to_uppercase().contains("BODEGA"))
        .cloned()
        .collect()
}

pub fn compute(directory: &StoreDirectory, brand: &str, inputs: BrandInputs) -> BrandReport {
    let universe = store_universe(directory);
    let universe_set: HashSet<&String> = universe.iter().collect();

    let mut products = Vec::with_capacity(inputs.top_sellers.len());
    let mut stores_with_top: HashSet<String> = HashSet::new();

    for seller in &inputs.top_sellers {
        let stock_rows = inputs
            .stock_by_barcode
            .get(&seller.barcode)
            .cloned()
            .unwrap_or_default();

        let mut stores_with = Vec::new();
        let mut seen = HashSet::new();
        let mut total_stock = 0;
        for (store_raw, available) in &stock_rows {
            total_stock += available;
            if *available <= 0 {
                continue;
            }
            // Only stores the directory knows count as presence.
            if let Some(entry) = directory.entry_for_raw(store_raw) {
                if universe_set.contains(&entry.clean_name) && seen.insert(entry.clean_name.clone())
                {
                    stores_with.push(entry.clean_name.clone());
                }
            }
        }
        stores_with_top.extend(stores_with.iter().cloned());

        let stores_without: Vec<String> = universe
            .iter()
            .filter(|store| !seen.contains(*store))
            .cloned()
            .collect();

        products.push(BrandProductLine {
            barcode: seller.barcode.clone(),
            brand: seller.brand.clone(),
            color: seller
                .color
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "N/A".to_string()),
            sold_30d: seller.units,
            missing_count: stores_without.len(),
            stores_with,
            stores_without,
            total_stock,
        });
    }

    let mut stores = Vec::with_capacity(universe.len());
    for store in &universe {
        let present: Vec<&BrandProductLine> = products
            .iter()
            .filter(|p| p.stores_with.contains(store))
            .collect();
        stores.push(BrandStoreLine {
            store: store.clone(),
            region: directory.region_of(store),
            top_products_present: present.len(),
            top_products_missing: products.len() - present.len(),
            sales_of_present: present.iter().map(|p| p.sold_30d).sum(),
        });
    }

    let summary = BrandSummary {
        product_count: products.len(),
        store_count: universe.len(),
        stores_with_top: stores_with_top.len(),
        redistribution_opportunities: products.iter().map(|p| p.missing_count).sum(),
    };
    let recommendation = format!(
        "Se detectaron {} tiendas con el top 10.",
        summary.stores_with_top
    );

    BrandReport {
        brand: brand.trim().to_uppercase(),
        summary,
        products,
        stores,
        recommendation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning_store::StoreEntry;

    fn directory() -> StoreDirectory {
        let mut planning = Planning::default();
        let entry = |raw: &str, clean: &str, region: &str| StoreEntry {
            raw_name: raw.to_string(),
            clean_name: clean.to_string(),
            region: region.to_string(),
            pinned: false,
            store_type: None,
            active: true,
        };
        planning.stores = vec![
            entry("T1 RAW", "TIENDA UNO", "NORTE"),
            entry("T2 RAW", "TIENDA DOS", "SUR"),
            entry("BOD RAW", "BODEGA JAGI", "CENTRO"),
        ];
        StoreDirectory::new(&planning)
    }

    fn seller(barcode: &str, units: i64) -> BrandSeller {
        BrandSeller {
            barcode: barcode.to_string(),
            brand: "ACME".to_string(),
            color: Some("ROJO".to_string()),
            units,
        }
    }

    #[test]
    fn presence_matrix_and_summary() {
        let dir = directory();
        let inputs = BrandInputs {
            top_sellers: vec![seller("B1", 12), seller("B2", 5)],
            stock_by_barcode: HashMap::from([
                (
                    "B1".to_string(),
                    vec![
                        ("T1 RAW".to_string(), 3),
                        ("T2 RAW".to_string(), 0),
                        ("BOD RAW".to_string(), 20),
                        ("UNKNOWN RAW".to_string(), 7),
                    ],
                ),
                ("B2".to_string(), vec![("T2 RAW".to_string(), 1)]),
            ]),
        };
        let report = compute(&dir, "acme", inputs);

        assert_eq!(report.brand, "ACME");
        assert_eq!(report.summary.store_count, 2); // the bodega is not a store
        assert_eq!(report.summary.product_count, 2);
        assert_eq!(report.summary.stores_with_top, 2);
        assert_eq!(report.summary.redistribution_opportunities, 2);

        let b1 = &report.products[0];
        assert_eq!(b1.stores_with, vec!["TIENDA UNO"]);
        assert_eq!(b1.stores_without, vec!["TIENDA DOS"]);
        // Total stock counts every row, warehouse and unknown included.
        assert_eq!(b1.total_stock, 30);
        assert_eq!(b1.missing_count, 1);

        let uno = report.stores.iter().find(|s| s.store == "TIENDA UNO").unwrap();
        assert_eq!(uno.top_products_present, 1);
        assert_eq!(uno.top_products_missing, 1);
        assert_eq!(uno.sales_of_present, 12);
        let dos = report.stores.iter().find(|s| s.store == "TIENDA DOS").unwrap();
        assert_eq!(dos.sales_of_present, 5);

        assert!(report.recommendation.contains("2 tiendas"));
    }

    #[test]
    fn missing_color_becomes_na() {
        let dir = directory();
        let inputs = BrandInputs {
            top_sellers: vec![BrandSeller {
                barcode: "B1".to_string(),
                brand: "ACME".to_string(),
                color: None,
                units: 0,
            }],
            ..Default::default()
        };
        let report = compute(&dir, "ACME", inputs);
        assert_eq!(report.products[0].color, "N/A");
        // Nothing in stock anywhere: every store is missing it.
        assert_eq!(report.products[0].missing_count, 2);
    }

    #[test]
    fn empty_brand_yields_empty_report() {
        let dir = directory();
        let report = compute(&dir, "NOPE", BrandInputs::default());
        assert_eq!(report.summary.product_count, 0);
        assert_eq!(report.summary.stores_with_top, 0);
        assert_eq!(report.stores.len(), 2);
    }
}
