// crates/sdm-store-sqlite/tests/repository.rs
// ============================================================================
// Module: SQLite Repository Contract Tests
// Description: Atomic save, view fetch, and audit history behavior.
// Purpose: Validate atomicity, round trips, history accumulation, append-only
//          audit rows, and digest verification.
// ============================================================================

//! ## Overview
//! Contract tests for [`sdm_store_sqlite::SqliteRepository`]:
//! - Save then fetch returns the saved sensitive values
//! - A failure on the second audit insert leaves no rows behind
//! - Repeated saves accumulate audit rows
//! - Audit rows reject UPDATE and DELETE
//! - Hashed entries verify against a claimed plaintext

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use proptest::prelude::*;
use rusqlite::Connection;
use sdm_core::DefaultNaming;
use sdm_core::FieldDescriptor;
use sdm_core::FieldValue;
use sdm_core::MessageDescriptor;
use sdm_core::RenderError;
use sdm_core::ValueType;
use sdm_core::digest;
use sdm_core::sql::APPEND_ONLY_MESSAGE;
use sdm_store_sqlite::Record;
use sdm_store_sqlite::RepositoryError;
use sdm_store_sqlite::SqliteConnectionConfig;
use sdm_store_sqlite::SqliteRepository;
use sdm_store_sqlite::open_connection;
use sdm_store_sqlite::open_in_memory;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn user_message() -> MessageDescriptor {
    MessageDescriptor::new(
        "User",
        vec![
            FieldDescriptor::new("id", ValueType::String).primary_key().audited(),
            FieldDescriptor::new("ssn", ValueType::Int64).sensitive(),
            FieldDescriptor::new("address", ValueType::String).sensitive().hashed(),
            FieldDescriptor::new("name", ValueType::String).audited(),
        ],
    )
}

fn user_repo(connection: &Connection) -> SqliteRepository {
    let repo = SqliteRepository::from_message(&user_message(), &DefaultNaming).unwrap();
    repo.migrate(connection).unwrap();
    repo
}

fn john() -> Record {
    Record::new()
        .with("id", "u_1")
        .with("ssn", 123_456_789_i64)
        .with("address", "123 Main St")
        .with("name", "John Doe")
}

fn count(connection: &Connection, sql: &str) -> i64 {
    connection.query_row(sql, [], |row| row.get(0)).unwrap()
}

fn row_counts(connection: &Connection) -> (i64, i64) {
    (
        count(connection, "SELECT COUNT(*) FROM \"UserPii\" WHERE \"id\" = 'u_1'"),
        count(connection, "SELECT COUNT(*) FROM \"UserChain\" WHERE \"key\" = 'u_1'"),
    )
}

// ============================================================================
// SECTION: Round Trip
// ============================================================================

#[test]
fn save_then_fetch_returns_saved_values() {
    let mut connection = open_in_memory().unwrap();
    let repo = user_repo(&connection);
    repo.save(&mut connection, &john()).unwrap();

    let view = repo.fetch(&connection, &FieldValue::from("u_1")).unwrap();
    assert_eq!(view.sensitive("id"), Some(&FieldValue::from("u_1")));
    assert_eq!(view.sensitive("ssn"), Some(&FieldValue::I64(123_456_789)));
    assert_eq!(view.sensitive("address"), Some(&FieldValue::from("123 Main St")));
    assert_eq!(view.audit("name"), Some("John Doe"));
    assert_eq!(view.audit("hashed_address"), Some(digest("123 Main St").as_str()));
    assert_eq!(view.len(), 5);
}

#[test]
fn fetch_of_absent_key_is_not_found() {
    let connection = open_in_memory().unwrap();
    let repo = user_repo(&connection);
    let err = repo.fetch(&connection, &FieldValue::from("u_404")).unwrap_err();
    assert_eq!(
        err,
        RepositoryError::NotFound {
            table: "user_view".to_string(),
            key: "u_404".to_string(),
        }
    );
}

#[test]
fn fetch_reads_latest_audit_value() {
    let mut connection = open_in_memory().unwrap();
    let repo = user_repo(&connection);
    repo.save(&mut connection, &john()).unwrap();
    repo.save(&mut connection, &john().with("name", "Johnny").with("ssn", 42_i64)).unwrap();

    let view = repo.fetch(&connection, &FieldValue::from("u_1")).unwrap();
    assert_eq!(view.audit("name"), Some("Johnny"));
    assert_eq!(view.sensitive("ssn"), Some(&FieldValue::I64(42)));
    assert_eq!(row_counts(&connection).0, 1);
}

#[test]
fn integer_keys_join_audit_rows() {
    let message = MessageDescriptor::new(
        "Account",
        vec![
            FieldDescriptor::new("account_id", ValueType::Uint64).primary_key(),
            FieldDescriptor::new("holder", ValueType::String).sensitive().audited(),
            FieldDescriptor::new("active", ValueType::Bool).audited(),
            FieldDescriptor::new("balance", ValueType::Double).sensitive(),
            FieldDescriptor::new("token", ValueType::Bytes).sensitive().hashed(),
        ],
    );
    let mut connection = open_in_memory().unwrap();
    let repo = SqliteRepository::from_message(&message, &DefaultNaming).unwrap();
    repo.migrate(&connection).unwrap();
    let record = Record::new()
        .with("account_id", 7_u64)
        .with("holder", "Ada")
        .with("active", true)
        .with("balance", 12.5_f64)
        .with("token", vec![0xde_u8, 0xad]);
    repo.save(&mut connection, &record).unwrap();

    let view = repo.fetch(&connection, &FieldValue::U64(7)).unwrap();
    assert_eq!(view.sensitive("account_id"), Some(&FieldValue::U64(7)));
    assert_eq!(view.sensitive("balance"), Some(&FieldValue::F64(12.5)));
    assert_eq!(view.sensitive("token"), Some(&FieldValue::Bytes(vec![0xde, 0xad])));
    assert_eq!(view.audit("active"), Some("true"));
    assert_eq!(view.audit("hashed_token"), Some(digest("dead").as_str()));
}

#[test]
fn uint64_beyond_sqlite_range_is_rejected_before_writing() {
    let message = MessageDescriptor::new(
        "Ticket",
        vec![
            FieldDescriptor::new("ticket_id", ValueType::Uint64).primary_key(),
            FieldDescriptor::new("serial", ValueType::Uint64).audited(),
        ],
    );
    let mut connection = open_in_memory().unwrap();
    let repo = SqliteRepository::from_message(&message, &DefaultNaming).unwrap();
    repo.migrate(&connection).unwrap();

    let oversized = Record::new().with("ticket_id", u64::MAX).with("serial", 1_u64);
    let err = repo.save(&mut connection, &oversized).unwrap_err();
    assert!(matches!(err, RepositoryError::Record(ref message) if message.contains("ticket_id")));
    assert_eq!(count(&connection, "SELECT COUNT(*) FROM \"TicketPii\""), 0);
    assert_eq!(count(&connection, "SELECT COUNT(*) FROM \"TicketChain\""), 0);

    let err = repo.fetch(&connection, &FieldValue::U64(u64::MAX)).unwrap_err();
    assert_eq!(
        err,
        RepositoryError::NotFound {
            table: "ticket_view".to_string(),
            key: u64::MAX.to_string(),
        }
    );

    let audited_only = Record::new().with("ticket_id", 9_u64).with("serial", u64::MAX);
    repo.save(&mut connection, &audited_only).unwrap();
    let view = repo.fetch(&connection, &FieldValue::U64(9)).unwrap();
    assert_eq!(view.audit("serial"), Some(u64::MAX.to_string().as_str()));
}

// ============================================================================
// SECTION: Atomicity
// ============================================================================

#[test]
fn failure_on_second_audit_insert_rolls_back_everything() {
    let mut connection = open_in_memory().unwrap();
    let repo = user_repo(&connection);
    connection
        .execute_batch(
            "CREATE TRIGGER fail_second_audit BEFORE INSERT ON \"UserChain\"
             WHEN (SELECT COUNT(*) FROM \"UserChain\" WHERE \"key\" = NEW.\"key\") >= 1
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
        )
        .unwrap();

    let err = repo.save(&mut connection, &john()).unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Transaction(ref message) if message.contains("injected failure")
    ));
    assert_eq!(row_counts(&connection), (0, 0));
    assert!(matches!(
        repo.fetch(&connection, &FieldValue::from("u_1")),
        Err(RepositoryError::NotFound { .. })
    ));
}

#[test]
fn failed_resave_keeps_previous_state() {
    let mut connection = open_in_memory().unwrap();
    let repo = user_repo(&connection);
    repo.save(&mut connection, &john()).unwrap();
    connection
        .execute_batch(
            "CREATE TRIGGER fail_name BEFORE INSERT ON \"UserChain\"
             WHEN NEW.\"field_name\" = 'name'
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
        )
        .unwrap();

    let err = repo.save(&mut connection, &john().with("ssn", 1_i64)).unwrap_err();
    assert!(matches!(err, RepositoryError::Transaction(_)));
    let view = repo.fetch(&connection, &FieldValue::from("u_1")).unwrap();
    assert_eq!(view.sensitive("ssn"), Some(&FieldValue::I64(123_456_789)));
    assert_eq!(repo.audit_history(&connection, &FieldValue::from("u_1")).unwrap().len(), 3);
}

#[test]
fn invalid_record_is_rejected_before_writing() {
    let mut connection = open_in_memory().unwrap();
    let repo = user_repo(&connection);

    let missing = Record::new().with("id", "u_1").with("ssn", 1_i64);
    let err = repo.save(&mut connection, &missing).unwrap_err();
    assert!(matches!(err, RepositoryError::Record(ref message) if message.contains("address")));

    let mistyped = john().with("ssn", "123-45-6789");
    let err = repo.save(&mut connection, &mistyped).unwrap_err();
    assert_eq!(
        err,
        RepositoryError::Hash(RenderError::TypeMismatch {
            field: "ssn".to_string(),
            expected: ValueType::Int64,
            actual: "string",
        })
    );
    assert_eq!(row_counts(&connection), (0, 0));
}

// ============================================================================
// SECTION: Audit History
// ============================================================================

#[test]
fn two_saves_produce_twice_the_audit_rows() {
    let mut connection = open_in_memory().unwrap();
    let repo = user_repo(&connection);
    repo.save(&mut connection, &john()).unwrap();
    repo.save(&mut connection, &john()).unwrap();

    let history = repo.audit_history(&connection, &FieldValue::from("u_1")).unwrap();
    assert_eq!(history.len(), 2 * repo.schemas().audit.entries.len());
    assert_eq!(history.len(), 6);
    let names: Vec<&str> = history.iter().map(|row| row.field_name.as_str()).collect();
    assert_eq!(names, vec!["id", "hashed_address", "name", "id", "hashed_address", "name"]);
    assert!(history.windows(2).all(|pair| pair[0].seq < pair[1].seq));
    assert_eq!(row_counts(&connection), (1, 6));
}

#[test]
fn audit_rows_reject_update_and_delete() {
    let mut connection = open_in_memory().unwrap();
    let repo = user_repo(&connection);
    repo.save(&mut connection, &john()).unwrap();

    let update =
        connection.execute("UPDATE \"UserChain\" SET \"field_value\" = 'tampered'", []).unwrap_err();
    assert!(update.to_string().contains(APPEND_ONLY_MESSAGE));
    let delete = connection.execute("DELETE FROM \"UserChain\"", []).unwrap_err();
    assert!(delete.to_string().contains(APPEND_ONLY_MESSAGE));
    assert_eq!(row_counts(&connection), (1, 3));
}

#[test]
fn hashed_entry_verifies_claimed_plaintext() {
    let mut connection = open_in_memory().unwrap();
    let repo = user_repo(&connection);
    repo.save(&mut connection, &john()).unwrap();
    let key = FieldValue::from("u_1");

    assert!(repo.verify_audit_value(&connection, &key, "address", &"123 Main St".into()).unwrap());
    assert!(!repo.verify_audit_value(&connection, &key, "address", &"9 Elm St".into()).unwrap());
    assert!(repo.verify_audit_value(&connection, &key, "name", &"John Doe".into()).unwrap());

    let err = repo.verify_audit_value(&connection, &key, "ssn", &FieldValue::I64(1)).unwrap_err();
    assert!(matches!(err, RepositoryError::Record(_)));
    let err = repo
        .verify_audit_value(&connection, &FieldValue::from("u_2"), "name", &"x".into())
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { ref table, .. } if table == "UserChain"));
}

#[test]
fn key_only_message_saves_and_fetches() {
    let message = MessageDescriptor::new(
        "Tag",
        vec![FieldDescriptor::new("tag", ValueType::String).primary_key()],
    );
    let mut connection = open_in_memory().unwrap();
    let repo = SqliteRepository::from_message(&message, &DefaultNaming).unwrap();
    repo.migrate(&connection).unwrap();
    let record = Record::new().with("tag", "red");
    repo.save(&mut connection, &record).unwrap();
    repo.save(&mut connection, &record).unwrap();

    let view = repo.fetch(&connection, &FieldValue::from("red")).unwrap();
    assert_eq!(view.len(), 1);
    assert!(repo.audit_history(&connection, &FieldValue::from("red")).unwrap().is_empty());
}

// ============================================================================
// SECTION: On-Disk
// ============================================================================

#[test]
fn on_disk_database_persists_across_connections() {
    let dir = TempDir::new().unwrap();
    let config = SqliteConnectionConfig::new(dir.path().join("sdm.db"));
    {
        let mut connection = open_connection(&config).unwrap();
        let repo = user_repo(&connection);
        repo.save(&mut connection, &john()).unwrap();
    }
    let connection = open_connection(&config).unwrap();
    let repo = user_repo(&connection);
    let view = repo.fetch(&connection, &FieldValue::from("u_1")).unwrap();
    assert_eq!(view.audit("name"), Some("John Doe"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn history_grows_by_entry_count_per_save(saves in 1_usize .. 6, name in "[a-zA-Z ]{0,12}") {
        let mut connection = open_in_memory().unwrap();
        let repo = user_repo(&connection);
        for _ in 0 .. saves {
            repo.save(&mut connection, &john().with("name", name.as_str())).unwrap();
        }
        let history = repo.audit_history(&connection, &FieldValue::from("u_1")).unwrap();
        prop_assert_eq!(history.len(), saves * 3);
        let view = repo.fetch(&connection, &FieldValue::from("u_1")).unwrap();
        prop_assert_eq!(view.audit("name"), Some(name.as_str()));
    }
}
