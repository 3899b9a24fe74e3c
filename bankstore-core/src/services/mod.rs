//! Service layer - orchestration on top of the ports

mod seed;

pub use seed::{SeedService, DEMO_ACCOUNT};
