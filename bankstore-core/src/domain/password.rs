//! Password hashing for account credentials
//!
//! Passwords are stored as Argon2id PHC strings
//! (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`). The parameters travel
//! inside the string, so verification works for hashes produced with any
//! cost setting.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Default Argon2id parameters (OWASP baseline)
pub const DEFAULT_TIME_COST: u32 = 2;
pub const DEFAULT_MEMORY_COST: u32 = 19456; // 19 MiB
pub const DEFAULT_PARALLELISM: u32 = 1;

/// Width of the `encrypted_password` column
pub const MAX_ENCODED_LEN: usize = 100;

const SALT_LEN: usize = 16;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    pub time_cost: u32,
    /// Memory in KiB
    pub memory_cost: u32,
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            time_cost: DEFAULT_TIME_COST,
            memory_cost: DEFAULT_MEMORY_COST,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl Argon2Params {
    fn hasher(&self) -> Result<Argon2<'static>> {
        let params = Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|e| Error::validation(format!("invalid argon2 params: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hash a plaintext password into a PHC string
pub fn hash_password(plaintext: &str, params: &Argon2Params) -> Result<String> {
    let salt_bytes: [u8; SALT_LEN] = rand::thread_rng().gen();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| Error::validation(format!("failed to encode salt: {}", e)))?;

    let encoded = params
        .hasher()?
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| Error::validation(format!("failed to hash password: {}", e)))?
        .to_string();

    if encoded.len() > MAX_ENCODED_LEN {
        return Err(Error::validation(format!(
            "password hash is {} bytes, column holds {}",
            encoded.len(),
            MAX_ENCODED_LEN
        )));
    }

    Ok(encoded)
}

/// Check a plaintext password against a stored PHC string
///
/// Malformed hashes never verify.
pub fn verify_password(plaintext: &str, encoded: &str) -> bool {
    match PasswordHash::new(encoded) {
        Ok(parsed) => Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
