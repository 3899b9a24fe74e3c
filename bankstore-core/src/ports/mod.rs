//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. Callers depend
//! only on these traits, not on concrete implementations.

mod context;
mod storage;

pub use context::{CancelSignal, OpContext};
pub use storage::Storage;
