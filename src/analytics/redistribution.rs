//! Store-to-store transfer suggestions within a region.
//!
//! Stores sitting on stock that does not move feed stores that sell the
//! same reference and sit below their minimum. Half of the origin surplus
//! caps the transfer so the origin never drains completely.

use super::text::normalize_name;
use super::{dynamic_min_stock, AnalyticsError, ParamsError, StoreDirectory};
use crate::planning_store::{Planning, RuleKind};
use crate::snapshot_store::SnapshotStore;
use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug, Serialize)]
pub struct RedistributionParams {
    pub window_days: i64,
    pub min_sales: i64,
    pub source_store: Option<String>,
}

impl Default for RedistributionParams {
    fn default() -> Self {
        RedistributionParams {
            window_days: 30,
            min_sales: 1,
            source_store: None,
        }
    }
}

impl RedistributionParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(1..=180).contains(&self.window_days) {
            return Err(ParamsError::InvalidRange {
                name: "window_days",
                min: 1,
                max: 180,
                value: self.window_days,
            });
        }
        if self.min_sales < 1 {
            return Err(ParamsError::InvalidRange {
                name: "min_sales",
                min: 1,
                max: i64::MAX,
                value: self.min_sales,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RedistributionLine {
    pub region: String,
    pub barcode: String,
    pub brand: String,
    pub origin_store: String,
    pub destination_store: String,
    pub suggested: i64,
}

/// One (store, barcode, brand) position with its stock, window sales and
/// minimum. Built from the snapshot; `compute` works on these alone.
#[derive(Clone, Debug)]
pub struct Position {
    pub store: String,
    pub region: String,
    pub barcode: String,
    pub brand: String,
    pub stock: i64,
    pub sold_in_window: i64,
    pub min_stock: i64,
    pub pinned_store: bool,
}

pub fn run(
    snapshot: &dyn SnapshotStore,
    planning: &Planning,
    params: &RedistributionParams,
) -> Result<Vec<RedistributionLine>, AnalyticsError> {
    params.validate()?;
    let directory = StoreDirectory::new(planning);
    let since = Utc::now().date_naive() - Duration::days(params.window_days);

    // Sales keyed by (normalized store, barcode, brand).
    let mut sales: HashMap<(String, String, String), i64> = HashMap::new();
    for agg in snapshot.sales_by_store_product_brand(since)? {
        let store_norm = normalize_name(&directory.resolve(&agg.store_raw));
        *sales
            .entry((store_norm, agg.barcode, agg.brand.to_uppercase()))
            .or_insert(0) += agg.units;
    }

    let mut positions = Vec::new();
    for row in snapshot.store_stock_rows()? {
        let store = directory.resolve(&row.store_raw);
        let store_norm = normalize_name(&store);
        let barcode = row.barcode.trim().to_uppercase();
        let brand = row.brand.to_uppercase();
        let sold_in_window = *sales
            .get(&(store_norm, barcode.clone(), brand.clone()))
            .unwrap_or(&0);
        let min_stock = dynamic_min_stock(planning, &barcode, &brand, RuleKind::FixedNormal);
        positions.push(Position {
            region: directory.region_of(&store),
            pinned_store: directory.is_pinned(&store),
            store,
            barcode,
            brand,
            stock: row.available,
            sold_in_window,
            min_stock,
        });
    }

    Ok(compute(positions, params))
}

pub fn compute(positions: Vec<Position>, params: &RedistributionParams) -> Vec<RedistributionLine> {
    let mut origins: Vec<&Position> = positions
        .iter()
        .filter(|p| p.stock > p.min_stock && p.sold_in_window == 0 && !p.pinned_store)
        .collect();
    let mut destinations: Vec<&Position> = positions
        .iter()
        .filter(|p| p.stock < p.min_stock && p.sold_in_window >= params.min_sales)
        .collect();

    if let Some(source) = &params.source_store {
        let source_norm = normalize_name(source);
        origins.retain(|p| normalize_name(&p.store) == source_norm);
        let Some(region) = origins.first().map(|p| p.region.clone()) else {
            return Vec::new();
        };
        destinations.retain(|p| p.region == region);
    }

    let mut lines = Vec::new();
    for origin in &origins {
        for dest in &destinations {
            if origin.region != dest.region
                || origin.barcode != dest.barcode
                || origin.brand != dest.brand
            {
                continue;
            }
            let surplus_half = (origin.stock - origin.min_stock) / 2;
            let deficit = dest.min_stock - dest.stock;
            let suggested = surplus_half.min(deficit).max(1);
            if suggested > 0 {
                lines.push(RedistributionLine {
                    region: origin.region.clone(),
                    barcode: origin.barcode.clone(),
                    brand: origin.brand.clone(),
                    origin_store: origin.store.clone(),
                    destination_store: dest.store.clone(),
                    suggested,
                });
            }
        }
    }

    lines.sort_by(|a, b| {
        (&a.region, &a.barcode, &a.origin_store, &a.destination_store).cmp(&(
            &b.region,
            &b.barcode,
            &b.origin_store,
            &b.destination_store,
        ))
    });
    lines
}
