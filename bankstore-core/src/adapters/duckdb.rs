//! DuckDB storage implementation

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use duckdb::{params, AccessMode, Connection};

use super::row::scan_account;
use crate::config::StoreConfig;
use crate::domain::result::{Error, LookupKey, Result};
use crate::domain::Account;
use crate::ports::{OpContext, Storage};
use crate::schema::{ACCOUNT_COLUMNS, SCHEMA};

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Statement phases shared between a caller and its blocking task
const PENDING: u8 = 0;
const ISSUED: u8 = 1;
const ABANDONED: u8 = 2;

/// Catalog name of an attached encrypted database
const ENCRYPTED_CATALOG: &str = "main_db";

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Error::query(err)
    }
}

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("could not set lock on file")
        || lower.contains("file is already open")
}

/// Check if an error message reports a clash on the unique `number` column
fn is_number_violation(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("duplicate key \"number:")
}

/// Quote a value for a SQL string literal
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// DuckDB-backed [`Storage`]
///
/// Owns the database handle for its whole lifetime. Each statement runs on
/// tokio's blocking pool with its own connection cloned from that handle, so
/// concurrent calls only contend inside the engine. Every result set is
/// consumed or dropped before the blocking task returns.
pub struct DuckDbStore {
    conn: Arc<Mutex<Connection>>,
    config: StoreConfig,
}

impl DuckDbStore {
    /// Open the database described by `config`
    ///
    /// Retries with exponential backoff while the file is locked by another
    /// process. Any failure is an [`Error::Connection`].
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let attempts = config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            match Self::try_open_connection(config) {
                Ok(conn) => {
                    tracing::debug!(
                        path = ?config.path,
                        read_only = config.read_only,
                        encrypted = config.encryption_key.is_some(),
                        "database connection opened"
                    );
                    return Ok(Self {
                        conn: Arc::new(Mutex::new(conn)),
                        config: config.clone(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < attempts - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        tracing::debug!(
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            max_attempts = attempts,
                            "database busy, retrying: {}",
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(err_msg);
                        continue;
                    }
                    return Err(Error::connection(err_msg));
                }
            }
        }

        Err(Error::connection(last_error.unwrap_or_else(|| {
            format!("failed to open database after {} attempts", attempts)
        })))
    }

    /// Attempt to open and ping a connection (called by `connect` with retry logic)
    fn try_open_connection(config: &StoreConfig) -> duckdb::Result<Connection> {
        // Extension autoloading stays off; nothing here needs extensions
        let mut db_config = duckdb::Config::default().enable_autoload_extension(false)?;
        if let Some(threads) = config.threads {
            db_config = db_config.threads(i64::from(threads))?;
        }

        let conn = match (&config.path, &config.encryption_key) {
            (Some(path), Some(key)) => {
                // Encrypted file: open in-memory first, then ATTACH with the key
                let conn = Connection::open_in_memory_with_flags(db_config)?;
                let read_only = if config.read_only { ", READ_ONLY" } else { "" };
                conn.execute_batch(&format!(
                    "ATTACH {} AS {} (ENCRYPTION_KEY {}{})",
                    quote_literal(&path.display().to_string()),
                    ENCRYPTED_CATALOG,
                    quote_literal(key),
                    read_only
                ))?;
                conn.execute_batch(&format!("USE {}", ENCRYPTED_CATALOG))?;
                conn
            }
            (Some(path), None) => {
                if config.read_only {
                    db_config = db_config.access_mode(AccessMode::ReadOnly)?;
                }
                Connection::open_with_flags(path, db_config)?
            }
            (None, _) => Connection::open_in_memory_with_flags(db_config)?,
        };

        conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))?;
        Ok(conn)
    }

    /// Create the account table if it does not exist
    ///
    /// Idempotent; call once per process start.
    pub fn init(&self) -> Result<()> {
        let conn = self.lock()?;
        for (name, sql) in SCHEMA {
            conn.execute_batch(sql)?;
            tracing::debug!(object = *name, "schema object ensured");
        }
        Ok(())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        lock_connection(&self.conn)
    }

    /// Run `f` on a fresh connection on the blocking pool, bounded by `ctx`
    ///
    /// `ctx` only bounds the wait before the statement is issued. Once `f`
    /// has started, its own result is returned even if `ctx` fires, so a
    /// reported failure never hides a committed write.
    async fn with_conn<T, F>(&self, ctx: &OpContext, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        ctx.check()?;

        let base = Arc::clone(&self.conn);
        let encrypted = self.config.encryption_key.is_some();
        let task_ctx = ctx.clone();
        let phase = Arc::new(AtomicU8::new(PENDING));
        let task_phase = Arc::clone(&phase);

        let mut task = tokio::task::spawn_blocking(move || {
            let conn = clone_connection(&base, encrypted)?;
            task_ctx.check()?;
            if task_phase
                .compare_exchange(PENDING, ISSUED, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                // The caller already returned an error for this call
                return Err(Error::Cancelled);
            }
            f(&conn)
        });

        tokio::select! {
            joined = &mut task => join_result(joined),
            reason = ctx.done() => {
                match phase.compare_exchange(PENDING, ABANDONED, Ordering::SeqCst, Ordering::SeqCst) {
                    Ok(_) => Err(reason),
                    Err(_) => join_result(task.await),
                }
            }
        }
    }
}

fn join_result<T>(joined: std::result::Result<Result<T>, tokio::task::JoinError>) -> Result<T> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(Error::connection(format!("database task failed: {}", e))),
    }
}

fn lock_connection(conn: &Mutex<Connection>) -> Result<std::sync::MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| Error::connection(format!("connection lock poisoned: {}", e)))
}

/// New connection to the same database instance as `base`
///
/// The base lock is held only while cloning.
fn clone_connection(base: &Mutex<Connection>, encrypted: bool) -> Result<Connection> {
    let conn = lock_connection(base)?
        .try_clone()
        .map_err(|e| Error::connection(format!("failed to open connection: {}", e)))?;
    if encrypted {
        conn.execute_batch(&format!("USE {}", ENCRYPTED_CATALOG))?;
    }
    Ok(conn)
}

/// Select a single account matching `filter` (a `column = ?` clause)
fn fetch_one(conn: &Connection, filter: &str, value: i64, key: LookupKey) -> Result<Account> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM account WHERE {}",
        ACCOUNT_COLUMNS, filter
    ))?;
    let mut rows = stmt.query(params![value])?;

    let account = match rows.next()? {
        Some(row) => scan_account(row),
        None => Err(Error::NotFound(key)),
    };
    account
}

#[async_trait]
impl Storage for DuckDbStore {
    async fn create_account(&self, ctx: &OpContext, account: &Account) -> Result<i64> {
        account.validate()?;
        let account = account.clone();

        self.with_conn(ctx, move |conn| {
            conn.query_row(
                "INSERT INTO account
                    (first_name, last_name, number, encrypted_password, balance, created_at)
                 VALUES (?, ?, ?, ?, ?, make_timestamp(CAST(? AS BIGINT)))
                 RETURNING id",
                params![
                    account.first_name,
                    account.last_name,
                    account.number,
                    account.encrypted_password,
                    account.balance,
                    account.created_at.timestamp_micros(),
                ],
                |row| row.get::<_, i64>(0),
            )
            .map_err(|e| {
                if is_number_violation(&e.to_string()) {
                    Error::DuplicateNumber(account.number)
                } else {
                    Error::from(e)
                }
            })
        })
        .await
    }

    async fn delete_account(&self, ctx: &OpContext, id: i64) -> Result<()> {
        // Hard delete; zero affected rows is not an error
        self.with_conn(ctx, move |conn| {
            conn.execute("DELETE FROM account WHERE id = ?", params![id])?;
            Ok(())
        })
        .await
    }

    async fn update_account(&self, ctx: &OpContext, account: &Account) -> Result<()> {
        let id = account
            .id
            .ok_or_else(|| Error::validation("cannot update an account that has no id"))?;
        account.validate()?;
        let account = account.clone();

        self.with_conn(ctx, move |conn| {
            let updated = conn.execute(
                "UPDATE account SET first_name = ?, last_name = ?, balance = ? WHERE id = ?",
                params![account.first_name, account.last_name, account.balance, id],
            )?;
            if updated == 0 {
                return Err(Error::NotFound(LookupKey::Id(id)));
            }
            Ok(())
        })
        .await
    }

    async fn get_accounts(&self, ctx: &OpContext) -> Result<Vec<Account>> {
        self.with_conn(ctx, |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM account ORDER BY id",
                ACCOUNT_COLUMNS
            ))?;
            let mut rows = stmt.query([])?;

            let mut accounts = Vec::new();
            while let Some(row) = rows.next()? {
                accounts.push(scan_account(row)?);
            }
            Ok(accounts)
        })
        .await
    }

    async fn get_account_by_id(&self, ctx: &OpContext, id: i64) -> Result<Account> {
        self.with_conn(ctx, move |conn| {
            fetch_one(conn, "id = ?", id, LookupKey::Id(id))
        })
        .await
    }

    async fn get_account_by_number(&self, ctx: &OpContext, number: i64) -> Result<Account> {
        self.with_conn(ctx, move |conn| {
            fetch_one(conn, "number = ?", number, LookupKey::Number(number))
        })
        .await
    }
}
