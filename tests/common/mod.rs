//! Common test infrastructure
//!
//! Builds a temporary data directory with latin-1 Mahalo export files and
//! a seeded planning database, the way a production deployment would look
//! right after the nightly export drop.

mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{
    latin1, seed_planning, write_export_files, TestData, BODEGA_RAW, STORE_CENTRO_CLEAN,
    STORE_CENTRO_RAW, STORE_NORTE_CLEAN, STORE_NORTE_RAW, STORE_SUR_CLEAN, STORE_SUR_RAW,
};
