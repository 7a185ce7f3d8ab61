//! Durable planning configuration: store directory, minimum-stock rules,
//! pinned references, multibrand brands and exclusions.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One entry of the store directory, mapping an ERP warehouse name to the
/// canonical store the analytics report on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoreEntry {
    /// Name as it appears in the Mahalo exports.
    pub raw_name: String,
    pub clean_name: String,
    pub region: String,
    /// Pinned stores are served first during warehouse allocation.
    pub pinned: bool,
    pub store_type: Option<String>,
    pub active: bool,
}

/// The minimum-stock rule families, in rule precedence order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RuleKind {
    FixedSpecial,
    FixedNormal,
    Multibrand,
    Jgl,
    Jgm,
    Default,
}

impl RuleKind {
    pub const ALL: [RuleKind; 6] = [
        RuleKind::FixedSpecial,
        RuleKind::FixedNormal,
        RuleKind::Multibrand,
        RuleKind::Jgl,
        RuleKind::Jgm,
        RuleKind::Default,
    ];

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "fixed_special" => Some(RuleKind::FixedSpecial),
            "fixed_normal" => Some(RuleKind::FixedNormal),
            "multibrand" => Some(RuleKind::Multibrand),
            "jgl" => Some(RuleKind::Jgl),
            "jgm" => Some(RuleKind::Jgm),
            "default" => Some(RuleKind::Default),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RuleKind::FixedSpecial => "fixed_special",
            RuleKind::FixedNormal => "fixed_normal",
            RuleKind::Multibrand => "multibrand",
            RuleKind::Jgl => "jgl",
            RuleKind::Jgm => "jgm",
            RuleKind::Default => "default",
        }
    }

    /// Quantity applied when no rule row overrides this kind.
    pub fn fallback_quantity(&self) -> i64 {
        match self {
            RuleKind::FixedSpecial => 5,
            RuleKind::FixedNormal => 5,
            RuleKind::Multibrand => 2,
            RuleKind::Jgl => 3,
            RuleKind::Jgm => 3,
            RuleKind::Default => 4,
        }
    }
}

/// In-memory snapshot of the whole planning database, loaded once per
/// analytics run.
#[derive(Clone, Debug, Default)]
pub struct Planning {
    pub stores: Vec<StoreEntry>,
    pub rules: HashMap<RuleKind, i64>,
    pub pinned_barcodes: HashSet<String>,
    pub multibrand_brands: HashSet<String>,
    pub excluded_barcodes: HashSet<String>,
}

impl Planning {
    /// Effective quantity for a rule kind, falling back to the built-in
    /// defaults when the table has no row for it.
    pub fn rule(&self, kind: RuleKind) -> i64 {
        self.rules
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.fallback_quantity())
    }
}
