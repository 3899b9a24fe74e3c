//! Result and error types for the core library

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key used by a lookup that found nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum LookupKey {
    Id(i64),
    Number(i64),
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKey::Id(id) => write!(f, "account {} not found", id),
            LookupKey::Number(number) => write!(f, "account with number [{}] not found", number),
        }
    }
}

/// Core library error type
///
/// Storage backends surface these verbatim. "Absent" (`NotFound`) is kept
/// apart from "broken" (`Query`, `Scan`, `Connection`) so callers can branch.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Scan error: {0}")]
    Scan(String),

    #[error("Not found: {0}")]
    NotFound(LookupKey),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: account number {0} already exists")]
    DuplicateNumber(i64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Wrap a backend failure without altering it
    pub fn query(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Query(Box::new(err))
    }

    /// Create a scan error
    pub fn scan(msg: impl Into<String>) -> Self {
        Self::Scan(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The lookup key of a `NotFound` error
    pub fn lookup_key(&self) -> Option<LookupKey> {
        match self {
            Self::NotFound(key) => Some(*key),
            _ => None,
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
