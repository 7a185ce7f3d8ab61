mod models;
mod schema;
mod store;

pub use models::{
    BrandSeller, ProductRef, ReloadCounts, ReloadOutcome, ReloadRun, SalesAgg, SalesRow,
    SnapshotTables, StoreStockRow, TableCounts, WarehouseStockRow,
};
pub use store::{SnapshotError, SnapshotStore, SqliteSnapshotStore};
