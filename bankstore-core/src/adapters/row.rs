//! Row mapper - result row to `Account`

use chrono::DateTime;

use crate::domain::result::{Error, Result};
use crate::domain::Account;

/// Columns in an account row
pub const ACCOUNT_COLUMN_COUNT: usize = 7;

/// Map one row selected with [`crate::schema::ACCOUNT_COLUMNS`]
///
/// Column indices:
/// 0: id, 1: first_name, 2: last_name, 3: number, 4: encrypted_password,
/// 5: balance, 6: created_at (epoch microseconds)
///
/// A column count other than [`ACCOUNT_COLUMN_COUNT`] or any type mismatch
/// fails the whole row.
pub fn scan_account(row: &duckdb::Row<'_>) -> Result<Account> {
    let columns = row.as_ref().column_count();
    if columns != ACCOUNT_COLUMN_COUNT {
        return Err(Error::scan(format!(
            "expected {} columns, got {}",
            ACCOUNT_COLUMN_COUNT, columns
        )));
    }

    let created_us: i64 = column(row, 6, "created_at")?;
    let created_at = DateTime::from_timestamp_micros(created_us).ok_or_else(|| {
        Error::scan(format!("created_at out of range: {} microseconds", created_us))
    })?;

    Ok(Account {
        id: Some(column(row, 0, "id")?),
        first_name: column(row, 1, "first_name")?,
        last_name: column(row, 2, "last_name")?,
        number: column(row, 3, "number")?,
        encrypted_password: column(row, 4, "encrypted_password")?,
        balance: column(row, 5, "balance")?,
        created_at,
    })
}

fn column<T: duckdb::types::FromSql>(row: &duckdb::Row<'_>, idx: usize, name: &str) -> Result<T> {
    row.get(idx)
        .map_err(|e| Error::scan(format!("column {} ({}): {}", idx, name, e)))
}
