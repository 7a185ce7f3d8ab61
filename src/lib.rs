//! JAGI Analytics Library
//!
//! Read-only retail analytics over periodic CSV exports from the Mahalo ERP.
//! This library exposes the internal modules for testing and potential reuse.

pub mod analytics;
pub mod cli_style;
pub mod config;
pub mod ingest;
pub mod planning_store;
pub mod report;
pub mod snapshot_store;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use planning_store::{Planning, PlanningStore, RuleKind, SqlitePlanningStore};
pub use snapshot_store::{SnapshotStore, SqliteSnapshotStore};
