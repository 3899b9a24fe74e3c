//! Account domain model

use std::ops::RangeInclusive;

use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::password::{self, Argon2Params};
use super::result::{Error, Result};

/// Range account numbers are drawn from
pub const NUMBER_RANGE: RangeInclusive<i64> = 1..=999_999;

/// Longest first/last name the schema holds
pub const MAX_NAME_LEN: usize = 50;

/// A bank account held by one person
///
/// `id` is `None` until the store assigns one. `number` is the identifier
/// shown to customers and is unique across the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub number: i64,
    #[serde(skip_serializing, default)]
    pub encrypted_password: String,
    /// Minor units (cents)
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new, not yet persisted account
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        password: &str,
    ) -> Result<Self> {
        Self::with_params(first_name, last_name, password, &Argon2Params::default())
    }

    /// Create a new account hashing the password with explicit cost parameters
    pub fn with_params(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        password: &str,
        params: &Argon2Params,
    ) -> Result<Self> {
        if password.is_empty() {
            return Err(Error::validation("password cannot be empty"));
        }

        let mut account = Self {
            id: None,
            first_name: first_name.into().trim().to_string(),
            last_name: last_name.into().trim().to_string(),
            number: rand::thread_rng().gen_range(NUMBER_RANGE),
            encrypted_password: String::new(),
            balance: 0,
            // TIMESTAMP columns keep microseconds
            created_at: Utc::now().trunc_subsecs(6),
        };
        account.validate()?;
        account.encrypted_password = password::hash_password(password, params)?;

        Ok(account)
    }

    /// Validate the caller-editable fields
    pub fn validate(&self) -> Result<()> {
        validate_name("first name", &self.first_name)?;
        validate_name("last name", &self.last_name)?;
        Ok(())
    }

    /// Check a plaintext password against the stored hash
    pub fn verify_password(&self, plaintext: &str) -> bool {
        password::verify_password(plaintext, &self.encrypted_password)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} cannot be empty", field)));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(Error::validation(format!(
            "{} cannot be longer than {} characters",
            field, MAX_NAME_LEN
        )));
    }
    Ok(())
}
