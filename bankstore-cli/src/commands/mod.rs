//! CLI command implementations

pub mod accounts;
pub mod init;
pub mod seed;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use bankstore_core::adapters::duckdb::DuckDbStore;
use bankstore_core::config::StoreConfig;
use bankstore_core::{open_store, CancelSignal, OpContext};

/// Resolved command-line environment shared by every command
pub struct Session {
    pub dir: PathBuf,
    timeout: Option<Duration>,
    cancel: CancelSignal,
}

impl Session {
    pub fn new(dir: Option<PathBuf>, timeout_ms: Option<u64>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir,
            None => default_bankstore_dir()?,
        };

        let cancel = CancelSignal::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, cancelling in-flight operation");
                on_interrupt.cancel();
            }
        });

        Ok(Self {
            dir,
            timeout: timeout_ms.map(Duration::from_millis),
            cancel,
        })
    }

    /// Load config for the data directory, connect and ensure the schema
    pub fn open(&self) -> Result<Arc<DuckDbStore>> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create bankstore directory: {:?}", self.dir))?;

        let config = StoreConfig::load(&self.dir)
            .with_context(|| format!("Failed to load settings from {:?}", self.dir))?;

        open_store(&config).context("Failed to open account store")
    }

    /// Fresh context for one storage call
    ///
    /// The deadline starts when this is called, not when the session began.
    pub fn op_context(&self) -> OpContext {
        let ctx = match self.timeout {
            Some(timeout) => OpContext::with_timeout(timeout),
            None => OpContext::background(),
        };
        ctx.cancellable(self.cancel.clone())
    }
}

/// `~/.bankstore`
fn default_bankstore_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".bankstore"))
        .ok_or_else(|| anyhow!("Could not find home directory; pass --dir or set BANKSTORE_DIR"))
}
