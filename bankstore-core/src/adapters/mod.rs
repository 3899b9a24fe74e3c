//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the Storage port
//! - An in-memory map for tests and throwaway stores

pub mod duckdb;
pub mod memory;
pub mod row;
