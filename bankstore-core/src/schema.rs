//! Account table definition
//!
//! Every statement is idempotent so the whole list can run on each startup.
//! Format: (name, sql_content), applied in order.

pub const SCHEMA: &[(&str, &str)] = &[
    (
        "account_id_seq",
        "CREATE SEQUENCE IF NOT EXISTS account_id_seq START 1",
    ),
    (
        "account",
        "CREATE TABLE IF NOT EXISTS account (
            id                 BIGINT PRIMARY KEY DEFAULT nextval('account_id_seq'),
            first_name         VARCHAR(50)  NOT NULL,
            last_name          VARCHAR(50)  NOT NULL,
            number             BIGINT       NOT NULL UNIQUE,
            encrypted_password VARCHAR(100) NOT NULL,
            balance            BIGINT       NOT NULL DEFAULT 0,
            created_at         TIMESTAMP    NOT NULL
        )",
    ),
];

/// Column list in the order the row mapper reads it
///
/// `created_at` is selected as microseconds since the epoch.
pub const ACCOUNT_COLUMNS: &str = "id, first_name, last_name, number, encrypted_password, \
     balance, epoch_us(created_at) AS created_at";
