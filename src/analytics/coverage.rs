//! Days-of-stock coverage per (store, product).
//!
//! Answers "how long does the current stock last at the current sales
//! rate, and how much is missing to cover the target horizon".

use super::text::normalize_name;
use super::{AnalyticsError, ParamsError, StoreDirectory, WAREHOUSE_STORE_MARKER};
use crate::planning_store::Planning;
use crate::snapshot_store::SnapshotStore;
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Clone, Debug, Serialize)]
pub struct CoverageParams {
    pub sales_window_days: i64,
    pub target_days: i64,
    /// `DD/MM/YYYY`; overrides the relative window together with `to`.
    pub from: Option<String>,
    pub to: Option<String>,
    pub stores: Vec<String>,
    pub products: Vec<String>,
    pub include_dormant: bool,
}

impl Default for CoverageParams {
    fn default() -> Self {
        CoverageParams {
            sales_window_days: 30,
            target_days: 60,
            from: None,
            to: None,
            stores: Vec::new(),
            products: Vec::new(),
            include_dormant: false,
        }
    }
}

fn parse_request_date(raw: &str) -> Result<NaiveDate, ParamsError> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y")
        .map_err(|_| ParamsError::BadDate(raw.to_string()))
}

impl CoverageParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(1..=90).contains(&self.sales_window_days) {
            return Err(ParamsError::InvalidRange {
                name: "sales_window_days",
                min: 1,
                max: 90,
                value: self.sales_window_days,
            });
        }
        if !(self.sales_window_days..=180).contains(&self.target_days) {
            return Err(ParamsError::InvalidRange {
                name: "target_days",
                min: self.sales_window_days,
                max: 180,
                value: self.target_days,
            });
        }
        self.resolve_window(Utc::now().date_naive())?;
        Ok(())
    }

    /// The effective (since, until, length-in-days) window. Explicit dates
    /// win over the relative window.
    pub fn resolve_window(
        &self,
        today: NaiveDate,
    ) -> Result<(NaiveDate, Option<NaiveDate>, i64), ParamsError> {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => {
                let from_date = parse_request_date(from)?;
                let to_date = parse_request_date(to)?;
                if to_date < from_date {
                    return Err(ParamsError::InvalidDateRange {
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
                let length = (to_date - from_date).num_days() + 1;
                Ok((from_date, Some(to_date), length))
            }
            (Some(from), None) => {
                let from_date = parse_request_date(from)?;
                let length = (today - from_date).num_days().max(1);
                Ok((from_date, None, length))
            }
            (None, Some(to)) => Err(ParamsError::BadDate(format!(
                "'to' ({}) given without 'from'",
                to
            ))),
            (None, None) => Ok((
                today - Duration::days(self.sales_window_days),
                None,
                self.sales_window_days,
            )),
        }
    }

    fn store_filter(&self) -> HashSet<String> {
        self.stores
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().to_uppercase())
            .collect()
    }

    fn product_filter(&self) -> HashSet<String> {
        self.products
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().to_uppercase())
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum CoveragePriority {
    High,
    Medium,
    Low,
}

impl CoveragePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoveragePriority::High => "ALTA",
            CoveragePriority::Medium => "MEDIA",
            CoveragePriority::Low => "BAJA",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CoverageLine {
    pub store: String,
    pub barcode: String,
    pub brand: String,
    pub available: i64,
    pub sold_in_window: i64,
    pub avg_daily: f64,
    /// None when the product did not move in the window.
    pub coverage_days: Option<f64>,
    pub need: i64,
    pub priority: CoveragePriority,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct StoreCoverageRollup {
    pub store: String,
    pub items: usize,
    pub items_with_need: usize,
    pub units_needed: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct CoverageReport {
    pub lines: Vec<CoverageLine>,
    pub total_items: usize,
    pub items_with_need: usize,
    pub units_needed: i64,
    pub per_store: Vec<StoreCoverageRollup>,
}

/// One (store, barcode) position: aggregated stock plus window sales.
#[derive(Clone, Debug)]
pub struct CoveragePosition {
    pub store: String,
    pub barcode: String,
    pub brand: String,
    pub available: i64,
    pub sold_in_window: i64,
}

pub fn run(
    snapshot: &dyn SnapshotStore,
    planning: &Planning,
    params: &CoverageParams,
) -> Result<CoverageReport, AnalyticsError> {
    params.validate()?;
    let directory = StoreDirectory::new(planning);
    let today = Utc::now().date_naive();
    let (since, until, window_len) = params.resolve_window(today)?;

    let mut sales: HashMap<(String, String), i64> = HashMap::new();
    for ((store_raw, barcode), units) in snapshot.sales_by_store_product(since, until)? {
        *sales
            .entry((directory.resolve(&store_raw), barcode))
            .or_insert(0) += units;
    }

    // Aggregate stock per (store, barcode); the exports may split one
    // position over several rows.
    let mut positions: BTreeMap<(String, String), CoveragePosition> = BTreeMap::new();
    for row in snapshot.store_stock_rows()? {
        let store = directory.resolve(&row.store_raw);
        if normalize_name(&store).contains(WAREHOUSE_STORE_MARKER) {
            continue;
        }
        let barcode = row.barcode.trim().to_uppercase();
        let sold = *sales.get(&(store.clone(), barcode.clone())).unwrap_or(&0);
        let entry = positions
            .entry((store.clone(), barcode.clone()))
            .or_insert_with(|| CoveragePosition {
                store,
                barcode,
                brand: row.brand.to_uppercase(),
                available: 0,
                sold_in_window: sold,
            });
        entry.available += row.available;
    }

    Ok(compute(
        positions.into_values().collect(),
        window_len,
        params,
    ))
}

pub fn compute(
    positions: Vec<CoveragePosition>,
    window_len: i64,
    params: &CoverageParams,
) -> CoverageReport {
    let store_filter = params.store_filter();
    let product_filter = params.product_filter();
    let window_len = window_len.max(1) as f64;
    let target = params.target_days as f64;

    let mut lines = Vec::new();
    for position in positions {
        if !store_filter.is_empty() && !store_filter.contains(&position.store.to_uppercase()) {
            continue;
        }
        if !product_filter.is_empty() && !product_filter.contains(&position.barcode) {
            continue;
        }
        let dormant = position.sold_in_window <= 0;
        if dormant && !params.include_dormant {
            continue;
        }

        let avg_daily = if dormant {
            0.0
        } else {
            position.sold_in_window as f64 / window_len
        };
        let coverage_days = if avg_daily > 0.0 {
            Some(position.available as f64 / avg_daily)
        } else {
            None
        };
        let need = ((avg_daily * target).ceil() as i64 - position.available).max(0);
        let priority = if dormant {
            CoveragePriority::Low
        } else if position.available == 0 || coverage_days.unwrap_or(f64::MAX) < target / 3.0 {
            CoveragePriority::High
        } else if coverage_days.unwrap_or(f64::MAX) < target {
            CoveragePriority::Medium
        } else {
            CoveragePriority::Low
        };

        lines.push(CoverageLine {
            store: position.store,
            barcode: position.barcode,
            brand: position.brand,
            available: position.available,
            sold_in_window: position.sold_in_window,
            avg_daily,
            coverage_days,
            need,
            priority,
        });
    }

    lines.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(b.need.cmp(&a.need))
            .then(a.store.cmp(&b.store))
            .then(a.barcode.cmp(&b.barcode))
    });

    let mut per_store: BTreeMap<String, StoreCoverageRollup> = BTreeMap::new();
    let mut items_with_need = 0;
    let mut units_needed = 0;
    for line in &lines {
        let rollup = per_store
            .entry(line.store.clone())
            .or_insert_with(|| StoreCoverageRollup {
                store: line.store.clone(),
                ..Default::default()
            });
        rollup.items += 1;
        if line.need > 0 {
            rollup.items_with_need += 1;
            rollup.units_needed += line.need;
            items_with_need += 1;
            units_needed += line.need;
        }
    }

    CoverageReport {
        total_items: lines.len(),
        items_with_need,
        units_needed,
        per_store: per_store.into_values().collect(),
        lines,
    }
}
