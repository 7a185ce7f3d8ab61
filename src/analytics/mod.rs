//! The analytics engines: restock, redistribution, coverage, brand
//! analysis and stock listings.
//!
//! Engines load a `Planning` snapshot and query the snapshot store, then
//! hand the heavy lifting to pure compute functions that are unit-tested
//! without a database.

pub mod brand;
pub mod coverage;
pub mod redistribution;
pub mod restock;
pub mod stock;
pub mod text;

use crate::planning_store::{Planning, PlanningError, RuleKind, StoreEntry};
use crate::snapshot_store::SnapshotError;
use std::collections::{HashMap, HashSet};
use text::normalize_name;
use thiserror::Error;

/// Fallback labels for rows the directory or the exports cannot resolve.
pub const NO_REGION: &str = "SIN REGION";
pub const NO_BRAND: &str = "SIN MARCA";
pub const NO_COLOR: &str = "SIN COLOR";

/// The central warehouse shows up in the exports as a store; analytics
/// must not treat it as one.
pub(crate) const WAREHOUSE_STORE_MARKER: &str = "bodega jagi";

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("{name} must be between {min} and {max}, got {value}")]
    InvalidRange {
        name: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },

    #[error("invalid date '{0}', expected DD/MM/YYYY")]
    BadDate(String),

    #[error("'to' date {to} is before 'from' date {from}")]
    InvalidDateRange { from: String, to: String },
}

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("product not found: {0}")]
    ProductNotFound(String),

    #[error("store not found: {0}")]
    StoreNotFound(String),

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error("snapshot database error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("planning database error: {0}")]
    Planning(#[from] PlanningError),
}

/// Name-resolution view over the store directory, shared by all engines.
pub struct StoreDirectory {
    clean_by_raw: HashMap<String, String>,
    region_by_norm: HashMap<String, String>,
    pinned_norm: HashSet<String>,
    entry_by_raw: HashMap<String, StoreEntry>,
    universe: Vec<String>,
}

impl StoreDirectory {
    pub fn new(planning: &Planning) -> Self {
        let mut clean_by_raw = HashMap::new();
        let mut region_by_norm = HashMap::new();
        let mut pinned_norm = HashSet::new();
        let mut entry_by_raw = HashMap::new();
        let mut universe = Vec::new();
        let mut seen = HashSet::new();

        for entry in &planning.stores {
            let norm = normalize_name(&entry.clean_name);
            clean_by_raw.insert(entry.raw_name.clone(), entry.clean_name.clone());
            region_by_norm.insert(norm.clone(), entry.region.clone());
            if entry.pinned {
                pinned_norm.insert(norm.clone());
            }
            entry_by_raw.insert(entry.raw_name.clone(), entry.clone());
            if seen.insert(norm) {
                universe.push(entry.clean_name.clone());
            }
        }

        StoreDirectory {
            clean_by_raw,
            region_by_norm,
            pinned_norm,
            entry_by_raw,
            universe,
        }
    }

    /// Canonical name for a raw ERP name; unmapped names pass through.
    pub fn resolve(&self, raw_name: &str) -> String {
        self.clean_by_raw
            .get(raw_name)
            .cloned()
            .unwrap_or_else(|| raw_name.trim().to_string())
    }

    pub fn region_of(&self, store_name: &str) -> String {
        self.region_by_norm
            .get(&normalize_name(store_name))
            .cloned()
            .unwrap_or_else(|| NO_REGION.to_string())
    }

    pub fn is_pinned(&self, store_name: &str) -> bool {
        self.pinned_norm.contains(&normalize_name(store_name))
    }

    pub fn entry_for_raw(&self, raw_name: &str) -> Option<&StoreEntry> {
        self.entry_by_raw.get(raw_name)
    }

    /// Distinct canonical store names, in directory order.
    pub fn universe(&self) -> &[String] {
        &self.universe
    }
}

/// Minimum-stock rule resolution shared by restock and redistribution.
/// `pinned_rule` is the kind applied to pinned barcodes: restock uses
/// fixed_special/fixed_normal depending on the store, redistribution
/// always fixed_normal. Barcode and brand must already be uppercase.
pub(crate) fn dynamic_min_stock(
    planning: &Planning,
    barcode: &str,
    brand: &str,
    pinned_rule: RuleKind,
) -> i64 {
    if planning.pinned_barcodes.contains(barcode) {
        return planning.rule(pinned_rule);
    }
    if planning.multibrand_brands.contains(brand) {
        return planning.rule(RuleKind::Multibrand);
    }
    if barcode.contains("JGL") || brand.contains("JGL") {
        return planning.rule(RuleKind::Jgl);
    }
    if barcode.contains("JGM") || brand.contains("JGM") {
        return planning.rule(RuleKind::Jgm);
    }
    planning.rule(RuleKind::Default)
}
