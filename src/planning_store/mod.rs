mod models;
mod schema;
mod store;

pub use models::{Planning, RuleKind, StoreEntry};
pub use store::{PlanningError, PlanningStore, SqlitePlanningStore};
