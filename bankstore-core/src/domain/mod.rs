//! Core domain entities
//!
//! Pure data structures with validation logic. No I/O beyond the password
//! hasher's CPU work.

mod account;
pub mod password;
pub mod result;

pub use account::{Account, MAX_NAME_LEN, NUMBER_RANGE};
pub use password::Argon2Params;
pub use result::{Error, LookupKey, Result};
