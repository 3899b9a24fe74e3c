//! Configuration management
//!
//! Connection settings live under the `database` key of `settings.json` in
//! the bankstore directory:
//! ```json
//! {
//!   "database": { "path": "bankstore.duckdb", "readOnly": false, "threads": 4 }
//! }
//! ```
//! Environment variables override the file:
//! `BANKSTORE_DB_PATH` (`:memory:` for an in-memory database),
//! `BANKSTORE_DB_KEY`, `BANKSTORE_DB_READ_ONLY`, `BANKSTORE_DB_THREADS`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

/// Default database file name inside the bankstore directory
pub const DEFAULT_DB_FILENAME: &str = "bankstore.duckdb";

/// Path value selecting an in-memory database
pub const IN_MEMORY: &str = ":memory:";

const DEFAULT_MAX_RETRIES: u32 = 5;

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    database: Option<StoreConfig>,
    #[serde(flatten)]
    other: serde_json::Map<String, serde_json::Value>,
}

/// Connection settings for the DuckDB store
///
/// The encryption key is kept as its own field and never shows up in
/// `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Database file; `None` opens an in-memory database
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Hex-encoded key for an encrypted database file
    #[serde(default, skip_serializing)]
    pub encryption_key: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    /// DuckDB worker threads (engine default when unset)
    #[serde(default)]
    pub threads: Option<u32>,
    /// Attempts to open a file locked by another process
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("path", &self.path)
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "<redacted>"),
            )
            .field("read_only", &self.read_only)
            .field("threads", &self.threads)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl StoreConfig {
    /// In-memory database, gone when the store is dropped
    pub fn in_memory() -> Self {
        Self {
            path: None,
            encryption_key: None,
            read_only: false,
            threads: None,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Database backed by `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::in_memory()
        }
    }

    /// Load config for a bankstore directory
    ///
    /// Reads `settings.json` when present, then applies environment
    /// overrides. A relative `path` is resolved against `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let settings_path = dir.join("settings.json");

        let settings: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content)?
        } else {
            SettingsFile::default()
        };

        let mut config = settings
            .database
            .unwrap_or_else(|| Self::file(DEFAULT_DB_FILENAME));
        config.apply_overrides(|name| std::env::var(name).ok())?;

        if let Some(path) = &config.path {
            if path.is_relative() {
                config.path = Some(dir.join(path));
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply `BANKSTORE_DB_*` overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("BANKSTORE_DB_PATH") {
            self.path = match path.as_str() {
                IN_MEMORY => None,
                _ => Some(PathBuf::from(path)),
            };
        }

        if let Some(key) = lookup("BANKSTORE_DB_KEY").filter(|k| !k.is_empty()) {
            self.encryption_key = Some(key);
        }

        match lookup("BANKSTORE_DB_READ_ONLY").as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => self.read_only = true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => self.read_only = false,
            Some(other) => {
                return Err(Error::config(format!(
                    "BANKSTORE_DB_READ_ONLY must be a boolean, got '{}'",
                    other
                )))
            }
            None => {}
        }

        if let Some(threads) = lookup("BANKSTORE_DB_THREADS") {
            let threads = threads.parse::<u32>().map_err(|_| {
                Error::config(format!(
                    "BANKSTORE_DB_THREADS must be a positive integer, got '{}'",
                    threads
                ))
            })?;
            self.threads = Some(threads);
        }

        Ok(())
    }

    /// Reject combinations DuckDB cannot open
    pub fn validate(&self) -> Result<()> {
        if self.path.is_none() {
            if self.read_only {
                return Err(Error::config("an in-memory database cannot be read-only"));
            }
            if self.encryption_key.is_some() {
                return Err(Error::config("an in-memory database cannot be encrypted"));
            }
        }
        if self.threads == Some(0) {
            return Err(Error::config("threads must be at least 1"));
        }
        Ok(())
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.is_none()
    }
}
