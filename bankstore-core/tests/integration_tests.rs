//! Integration tests for the Storage implementations
//!
//! Every contract test runs against the real DuckDB store (file-backed in a
//! temp dir) and against the in-memory store.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use bankstore_core::adapters::duckdb::DuckDbStore;
use bankstore_core::adapters::memory::InMemoryStore;
use bankstore_core::config::StoreConfig;
use bankstore_core::{
    open_store, Account, Argon2Params, CancelSignal, Error, LookupKey, OpContext, Storage,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Cheap hashing so tests don't spend their time in Argon2
fn test_params() -> Argon2Params {
    Argon2Params {
        time_cost: 1,
        memory_cost: 8,
        parallelism: 1,
    }
}

/// Create a file-backed store with schema initialized
fn create_test_store(temp_dir: &TempDir) -> Arc<DuckDbStore> {
    let config = StoreConfig::file(temp_dir.path().join("test.duckdb"));
    open_store(&config).expect("Failed to open store")
}

/// Both backends, labelled for assertion messages
fn backends(temp_dir: &TempDir) -> Vec<(&'static str, Arc<dyn Storage>)> {
    vec![
        ("duckdb", create_test_store(temp_dir) as Arc<dyn Storage>),
        ("memory", Arc::new(InMemoryStore::new()) as Arc<dyn Storage>),
    ]
}

fn create_test_account(first: &str, last: &str, number: i64) -> Account {
    let mut account =
        Account::with_params(first, last, "correct horse battery staple", &test_params())
            .expect("Failed to build account");
    account.number = number;
    account
}

// ============================================================================
// Round Trip Tests
// ============================================================================

#[tokio::test]
async fn test_create_then_get_by_id_round_trips_every_field() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    for (name, store) in backends(&temp_dir) {
        let mut account = create_test_account("Hermione", "Granger", 4242);
        account.balance = 10_050;

        let id = store.create_account(&ctx, &account).await.unwrap();
        let fetched = store.get_account_by_id(&ctx, id).await.unwrap();

        assert_eq!(fetched.id, Some(id), "{}: id", name);
        assert_eq!(
            fetched.encrypted_password.as_bytes(),
            account.encrypted_password.as_bytes(),
            "{}: password hash must be stored verbatim",
            name
        );
        assert_eq!(fetched.created_at, account.created_at, "{}: created_at", name);
        assert_eq!(fetched, Account { id: Some(id), ..account }, "{}", name);
        assert!(fetched.verify_password("correct horse battery staple"));
    }
}

#[tokio::test]
async fn test_harry_potter_lookup_by_number() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    for (name, store) in backends(&temp_dir) {
        let account = create_test_account("Harry", "Potter", 123);
        store.create_account(&ctx, &account).await.unwrap();

        let found = store.get_account_by_number(&ctx, 123).await.unwrap();
        assert_eq!(found.first_name, "Harry", "{}", name);
        assert_eq!(found.balance, 0, "{}", name);

        let err = store.get_account_by_number(&ctx, 124).await.unwrap_err();
        assert_eq!(err.lookup_key(), Some(LookupKey::Number(124)), "{}", name);
    }
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    for (name, store) in backends(&temp_dir) {
        let err = store.get_account_by_id(&ctx, 999).await.unwrap_err();
        assert!(
            matches!(err, Error::NotFound(LookupKey::Id(999))),
            "{}: got {:?}",
            name,
            err
        );
    }
}

// ============================================================================
// Listing Tests
// ============================================================================

#[tokio::test]
async fn test_get_accounts_on_empty_table_is_empty_vec() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    for (name, store) in backends(&temp_dir) {
        let accounts = store.get_accounts(&ctx).await.unwrap();
        assert!(accounts.is_empty(), "{}", name);
    }
}

#[tokio::test]
async fn test_get_accounts_returns_all_in_id_order() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    for (name, store) in backends(&temp_dir) {
        let mut ids = Vec::new();
        for (i, first) in ["Ron", "Ginny", "Fred"].iter().enumerate() {
            let account = create_test_account(first, "Weasley", 500 + i as i64);
            ids.push(store.create_account(&ctx, &account).await.unwrap());
        }

        let accounts = store.get_accounts(&ctx).await.unwrap();
        let listed: Vec<i64> = accounts.iter().filter_map(|a| a.id).collect();
        assert_eq!(listed, ids, "{}", name);
        assert_eq!(accounts[1].first_name, "Ginny", "{}", name);
    }
}

// ============================================================================
// Delete Tests
// ============================================================================

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    for (name, store) in backends(&temp_dir) {
        let account = create_test_account("Cedric", "Diggory", 77);
        let id = store.create_account(&ctx, &account).await.unwrap();

        store.delete_account(&ctx, id).await.unwrap();

        let err = store.get_account_by_id(&ctx, id).await.unwrap_err();
        assert_eq!(err.lookup_key(), Some(LookupKey::Id(id)), "{}", name);
        assert!(store.get_account_by_number(&ctx, 77).await.is_err(), "{}", name);
    }
}

#[tokio::test]
async fn test_delete_unknown_id_succeeds_and_leaves_others() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    for (name, store) in backends(&temp_dir) {
        let account = create_test_account("Luna", "Lovegood", 88);
        let id = store.create_account(&ctx, &account).await.unwrap();

        store
            .delete_account(&ctx, id + 1000)
            .await
            .unwrap_or_else(|e| panic!("{}: deleting unknown id failed: {}", name, e));

        assert_eq!(store.get_accounts(&ctx).await.unwrap().len(), 1, "{}", name);
    }
}

// ============================================================================
// Update Tests
// ============================================================================

#[tokio::test]
async fn test_update_changes_only_mutable_fields() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    for (name, store) in backends(&temp_dir) {
        let account = create_test_account("Neville", "Longbottom", 31);
        let id = store.create_account(&ctx, &account).await.unwrap();

        let mut edited = store.get_account_by_id(&ctx, id).await.unwrap();
        edited.first_name = "Nev".to_string();
        edited.balance = 2_500;
        // Not mutable through update
        edited.number = 32;
        edited.encrypted_password = "tampered".to_string();
        store.update_account(&ctx, &edited).await.unwrap();

        let fetched = store.get_account_by_id(&ctx, id).await.unwrap();
        assert_eq!(fetched.first_name, "Nev", "{}", name);
        assert_eq!(fetched.last_name, "Longbottom", "{}", name);
        assert_eq!(fetched.balance, 2_500, "{}", name);
        assert_eq!(fetched.number, 31, "{}", name);
        assert_eq!(fetched.encrypted_password, account.encrypted_password, "{}", name);
        assert_eq!(fetched.created_at, account.created_at, "{}", name);
    }
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    for (name, store) in backends(&temp_dir) {
        let mut account = create_test_account("Ghost", "Account", 1);
        account.id = Some(404);
        let err = store.update_account(&ctx, &account).await.unwrap_err();
        assert!(
            matches!(err, Error::NotFound(LookupKey::Id(404))),
            "{}: got {:?}",
            name,
            err
        );
    }
}

#[tokio::test]
async fn test_update_without_id_is_validation_error() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    for (name, store) in backends(&temp_dir) {
        let account = create_test_account("No", "Id", 2);
        let err = store.update_account(&ctx, &account).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{}: got {:?}", name, err);
    }
}

// ============================================================================
// Constraint Tests
// ============================================================================

#[tokio::test]
async fn test_duplicate_number_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    for (name, store) in backends(&temp_dir) {
        store
            .create_account(&ctx, &create_test_account("Fred", "Weasley", 1001))
            .await
            .unwrap();
        let err = store
            .create_account(&ctx, &create_test_account("George", "Weasley", 1001))
            .await
            .unwrap_err();

        assert!(
            matches!(err, Error::DuplicateNumber(1001)),
            "{}: got {:?}",
            name,
            err
        );
        assert_eq!(store.get_accounts(&ctx).await.unwrap().len(), 1, "{}", name);
    }
}

#[tokio::test]
async fn test_create_ignores_caller_supplied_id() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    for (name, store) in backends(&temp_dir) {
        let mut account = create_test_account("Draco", "Malfoy", 66);
        account.id = Some(9_999);
        let id = store.create_account(&ctx, &account).await.unwrap();
        assert_ne!(id, 9_999, "{}", name);
    }
}

// ============================================================================
// Deadline / Cancellation Tests
// ============================================================================

#[tokio::test]
async fn test_expired_deadline_issues_no_statement() {
    let temp_dir = TempDir::new().unwrap();

    for (name, store) in backends(&temp_dir) {
        let expired = OpContext::with_timeout(Duration::ZERO);
        let account = create_test_account("Late", "Caller", 3);

        let err = store.create_account(&expired, &account).await.unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded), "{}: got {:?}", name, err);

        let accounts = store.get_accounts(&OpContext::background()).await.unwrap();
        assert!(accounts.is_empty(), "{}: nothing should have been written", name);
    }
}

#[tokio::test]
async fn test_cancelled_context_fails_fast() {
    let temp_dir = TempDir::new().unwrap();

    for (name, store) in backends(&temp_dir) {
        let signal = CancelSignal::new();
        signal.cancel();
        let ctx = OpContext::background().cancellable(signal);

        let err = store.get_accounts(&ctx).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled), "{}: got {:?}", name, err);
    }
}

#[tokio::test]
async fn test_generous_deadline_completes() {
    let temp_dir = TempDir::new().unwrap();

    for (name, store) in backends(&temp_dir) {
        let ctx = OpContext::with_timeout(Duration::from_secs(30));
        let id = store
            .create_account(&ctx, &create_test_account("On", "Time", 4))
            .await
            .unwrap_or_else(|e| panic!("{}: {}", name, e));
        assert!(store.get_account_by_id(&ctx, id).await.is_ok(), "{}", name);
    }
}

/// Short deadlines racing real statements: a reported failure must mean
/// nothing was written, and a written row must have been reported
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deadline_never_hides_a_committed_create() {
    const ATTEMPTS: i64 = 200;
    let temp_dir = TempDir::new().unwrap();
    let check = OpContext::background();

    for (name, store) in backends(&temp_dir) {
        let accounts: Vec<Account> = (1..=ATTEMPTS)
            .map(|number| create_test_account("Race", "Condition", 50_000 + number))
            .collect();

        for account in &accounts {
            let ctx = OpContext::with_timeout(Duration::from_micros(300));
            let created = store.create_account(&ctx, account).await;
            let stored = store.get_account_by_number(&check, account.number).await;

            match (created, stored) {
                (Ok(id), Ok(found)) => assert_eq!(found.id, Some(id), "{}", name),
                (Err(Error::DeadlineExceeded), Err(e)) if e.is_not_found() => {}
                (created, stored) => panic!(
                    "{}: number {} reported {:?} but store holds {:?}",
                    name, account.number, created, stored
                ),
            }
        }
    }
}

// ============================================================================
// Malformed Row Tests (DuckDB only)
// ============================================================================

/// Write a row through a separate connection, bypassing the store
fn insert_raw(path: &std::path::Path, sql: &str) -> i64 {
    let conn = duckdb::Connection::open(path).unwrap();
    conn.query_row(sql, [], |row| row.get::<_, i64>(0)).unwrap()
}

#[tokio::test]
async fn test_unreadable_row_fails_reads_with_scan_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.duckdb");
    let ctx = OpContext::background();

    drop(create_test_store(&temp_dir));

    // Valid for DuckDB, beyond the range chrono can represent
    let id = insert_raw(
        &path,
        "INSERT INTO account (first_name, last_name, number, encrypted_password, balance, created_at)
         VALUES ('Tom', 'Riddle', 666, 'x', 0, make_timestamp(9000000000000000000::BIGINT))
         RETURNING id",
    );

    let store = create_test_store(&temp_dir);

    let err = store.get_account_by_id(&ctx, id).await.unwrap_err();
    assert!(matches!(err, Error::Scan(_)), "got {:?}", err);

    let err = store.get_account_by_number(&ctx, 666).await.unwrap_err();
    assert!(matches!(err, Error::Scan(_)), "got {:?}", err);

    let err = store.get_accounts(&ctx).await.unwrap_err();
    assert!(matches!(err, Error::Scan(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_id_clash_is_not_reported_as_duplicate_number() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.duckdb");
    let ctx = OpContext::background();

    drop(create_test_store(&temp_dir));

    // Takes the id the sequence will hand out next
    insert_raw(
        &path,
        "INSERT INTO account (id, first_name, last_name, number, encrypted_password, balance, created_at)
         VALUES (1, 'Sirius', 'Black', 1, 'x', 0, make_timestamp(0::BIGINT))
         RETURNING id",
    );

    let store = create_test_store(&temp_dir);
    let err = store
        .create_account(&ctx, &create_test_account("Remus", "Lupin", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Query(_)), "got {:?}", err);
}

// ============================================================================
// Lifecycle Tests (DuckDB only)
// ============================================================================

#[tokio::test]
async fn test_accounts_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();
    let account = create_test_account("Minerva", "McGonagall", 1935);

    let id = {
        let store = create_test_store(&temp_dir);
        store.create_account(&ctx, &account).await.unwrap()
    };

    // Re-running init on an existing file must not drop data
    let store = create_test_store(&temp_dir);
    let fetched = store.get_account_by_id(&ctx, id).await.unwrap();
    assert_eq!(fetched, Account { id: Some(id), ..account });
}

#[tokio::test]
async fn test_ids_keep_increasing_after_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();

    let first = {
        let store = create_test_store(&temp_dir);
        store
            .create_account(&ctx, &create_test_account("Albus", "Dumbledore", 1))
            .await
            .unwrap()
    };

    let store = create_test_store(&temp_dir);
    let second = store
        .create_account(&ctx, &create_test_account("Severus", "Snape", 2))
        .await
        .unwrap();
    assert!(second > first);
}

#[tokio::test]
async fn test_in_memory_duckdb_store() {
    let store = open_store(&StoreConfig::in_memory()).unwrap();
    let ctx = OpContext::background();

    let id = store
        .create_account(&ctx, &create_test_account("Rubeus", "Hagrid", 12))
        .await
        .unwrap();
    assert_eq!(store.get_account_by_number(&ctx, 12).await.unwrap().id, Some(id));
    assert!(store.config().is_in_memory());
}

#[tokio::test]
async fn test_operations_before_init_are_query_errors() {
    let store = DuckDbStore::connect(&StoreConfig::in_memory()).unwrap();
    let ctx = OpContext::background();

    let err = store.get_accounts(&ctx).await.unwrap_err();
    assert!(matches!(err, Error::Query(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_read_only_store_rejects_writes() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = OpContext::background();
    let path = temp_dir.path().join("test.duckdb");

    {
        let store = create_test_store(&temp_dir);
        store
            .create_account(&ctx, &create_test_account("Read", "Only", 5))
            .await
            .unwrap();
    }

    let mut config = StoreConfig::file(&path);
    config.read_only = true;
    let store = DuckDbStore::connect(&config).unwrap();

    assert_eq!(store.get_accounts(&ctx).await.unwrap().len(), 1);
    let err = store
        .create_account(&ctx, &create_test_account("New", "Row", 6))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Query(_)), "got {:?}", err);
}
