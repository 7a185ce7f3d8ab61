//! Flattening of analytics outputs into `TabularReport`s.

use super::TabularReport;
use crate::analytics::brand::BrandReport;
use crate::analytics::coverage::CoverageReport;
use crate::analytics::redistribution::RedistributionLine;
use crate::analytics::restock::RestockReport;
use crate::analytics::stock::StockLine;

pub fn restock_table(report: &RestockReport) -> TabularReport {
    let mut table = TabularReport::new(
        "Reabastecimiento",
        &[
            "region",
            "store",
            "barcode",
            "brand",
            "color",
            "sold_in_window",
            "available",
            "warehouse_stock",
            "warehouse_remaining",
            "min_stock",
            "assigned",
            "requested",
            "status",
        ],
    );
    for line in &report.lines {
        table.rows.push(vec![
            line.region.clone(),
            line.store.clone(),
            line.barcode.clone(),
            line.brand.clone(),
            line.color.clone(),
            line.sold_in_window.to_string(),
            line.available.to_string(),
            line.warehouse_stock.to_string(),
            line.warehouse_remaining.to_string(),
            line.min_stock.to_string(),
            line.assigned.to_string(),
            line.requested.to_string(),
            line.status.as_str().to_string(),
        ]);
    }
    table
}

pub fn redistribution_table(lines: &[RedistributionLine]) -> TabularReport {
    let mut table = TabularReport::new(
        "Redistribucion",
        &[
            "region",
            "barcode",
            "brand",
            "origin_store",
            "destination_store",
            "suggested",
        ],
    );
    for line in lines {
        table.rows.push(vec![
            line.region.clone(),
            line.barcode.clone(),
            line.brand.clone(),
            line.origin_store.clone(),
            line.destination_store.clone(),
            line.suggested.to_string(),
        ]);
    }
    table
}

pub fn coverage_table(report: &CoverageReport) -> TabularReport {
    let mut table = TabularReport::new(
        "Cobertura",
        &[
            "store",
            "barcode",
            "brand",
            "available",
            "sold_in_window",
            "avg_daily",
            "coverage_days",
            "need",
            "priority",
        ],
    );
    for line in &report.lines {
        table.rows.push(vec![
            line.store.clone(),
            line.barcode.clone(),
            line.brand.clone(),
            line.available.to_string(),
            line.sold_in_window.to_string(),
            format!("{:.2}", line.avg_daily),
            line.coverage_days
                .map(|days| format!("{:.1}", days))
                .unwrap_or_else(|| "-".to_string()),
            line.need.to_string(),
            line.priority.as_str().to_string(),
        ]);
    }
    table
}

pub fn stock_table(lines: &[StockLine]) -> TabularReport {
    let mut table = TabularReport::new(
        "Existencias",
        &[
            "store",
            "barcode",
            "brand",
            "available",
            "region",
            "store_type",
            "pinned",
        ],
    );
    for line in lines {
        table.rows.push(vec![
            line.store.clone(),
            line.barcode.clone(),
            line.brand.clone(),
            line.available.to_string(),
            line.region.clone(),
            line.store_type.clone().unwrap_or_default(),
            if line.pinned { "1" } else { "0" }.to_string(),
        ]);
    }
    table
}

pub fn brand_products_table(report: &BrandReport) -> TabularReport {
    let mut table = TabularReport::new(
        &format!("Top productos {}", report.brand),
        &[
            "barcode",
            "brand",
            "color",
            "sold_30d",
            "total_stock",
            "stores_with",
            "missing_count",
        ],
    );
    for product in &report.products {
        table.rows.push(vec![
            product.barcode.clone(),
            product.brand.clone(),
            product.color.clone(),
            product.sold_30d.to_string(),
            product.total_stock.to_string(),
            product.stores_with.join(", "),
            product.missing_count.to_string(),
        ]);
    }
    table
}

pub fn brand_stores_table(report: &BrandReport) -> TabularReport {
    let mut table = TabularReport::new(
        &format!("Tiendas {}", report.brand),
        &["store", "region", "present", "missing", "sales_30d"],
    );
    for store in &report.stores {
        table.rows.push(vec![
            store.store.clone(),
            store.region.clone(),
            store.top_products_present.to_string(),
            store.top_products_missing.to_string(),
            store.sales_of_present.to_string(),
        ]);
    }
    table
}
