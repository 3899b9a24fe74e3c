//! bankstore core - account persistence
//!
//! This crate follows hexagonal architecture:
//!
//! - **domain**: the Account entity, password hashing, error types
//! - **ports**: the `Storage` trait and per-operation `OpContext`
//! - **adapters**: DuckDB and in-memory implementations of `Storage`
//! - **services**: seeding on top of the port

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod schema;
pub mod services;

use std::sync::Arc;

use adapters::duckdb::DuckDbStore;
use config::StoreConfig;

// Re-export commonly used types at crate root
pub use domain::result::{Error, LookupKey, Result};
pub use domain::{Account, Argon2Params};
pub use ports::{CancelSignal, OpContext, Storage};

/// Connect to the configured database and ensure the schema exists
///
/// Startup entry point: a failure here means the process cannot serve
/// requests.
pub fn open_store(config: &StoreConfig) -> Result<Arc<DuckDbStore>> {
    let store = DuckDbStore::connect(config)?;
    store.init()?;
    Ok(Arc::new(store))
}
