// system-tests/tests/generated_repo.rs
// ============================================================================
// Module: Generated Repository Tests
// Description: Runs the repositories rendered from the ledger fixture.
// Purpose: Check generated save/fetch against the split-table contract.
// Dependencies: rusqlite, sdm-core, sdm-store-sqlite, sdm-system-tests
// ============================================================================

//! ## Overview
//! Each test opens a fresh in-memory database, migrates it with the
//! generated `SCHEMA`, and drives the generated repository types.

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
    clippy::float_cmp,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use rusqlite::Connection;
use sdm_core::digest;
use sdm_store_sqlite::RepositoryError;
use sdm_store_sqlite::open_in_memory;
use sdm_system_tests::ledger::EntryRecord;
use sdm_system_tests::ledger::EntryRepo;
use sdm_system_tests::ledger::HolderRecord;
use sdm_system_tests::ledger::HolderRepo;
use sdm_system_tests::ledger::TagRecord;
use sdm_system_tests::ledger::TagRepo;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn migrated() -> Connection {
    let mut connection = open_in_memory().unwrap();
    EntryRepo::new(&mut connection).migrate().unwrap();
    HolderRepo::new(&mut connection).migrate().unwrap();
    TagRepo::new(&mut connection).migrate().unwrap();
    connection
}

fn entry() -> EntryRecord {
    EntryRecord {
        entry_id: 7,
        memo: "rent".to_string(),
        amount: -1_250,
        units: 5,
        quota: 40,
        rate: 0.5,
        total: 1_250.75,
        settled: true,
        payload: vec![0xde, 0xad],
        r#type: 2,
        balance: 9_000,
    }
}

fn count(connection: &Connection, sql: &str) -> i64 {
    connection.query_row(sql, [], |row| row.get(0)).unwrap()
}

fn entry_counts(connection: &Connection) -> (i64, i64) {
    (
        count(connection, "SELECT COUNT(*) FROM \"EntryPii\""),
        count(connection, "SELECT COUNT(*) FROM \"EntryChain\""),
    )
}

// ============================================================================
// SECTION: Round Trip
// ============================================================================

#[test]
fn entry_round_trips_every_value_type() {
    let mut connection = migrated();
    let mut repo = EntryRepo::new(&mut connection);
    repo.save(&entry()).unwrap();

    let view = repo.fetch(7).unwrap();
    assert_eq!(view.entry_id, 7);
    assert_eq!(view.memo, "rent");
    assert_eq!(view.amount, -1_250);
    assert_eq!(view.units, 5);
    assert_eq!(view.quota, 40);
    assert_eq!(view.rate, 0.5);
    assert_eq!(view.total, 1_250.75);
    assert_eq!(view.payload, vec![0xde, 0xad]);
    assert_eq!(view.r#type, 2);
    assert_eq!(view.balance, 9_000);
    assert_eq!(view.hashed_units, Some(digest("5")));
    assert_eq!(view.settled.as_deref(), Some("true"));
    assert_eq!(view.hashed_payload, Some(digest("dead")));
}

#[test]
fn resave_upserts_and_reads_latest_audit_values() {
    let mut connection = migrated();
    let mut repo = EntryRepo::new(&mut connection);
    repo.save(&entry()).unwrap();
    repo.save(&EntryRecord {
        memo: "deposit".to_string(),
        settled: false,
        ..entry()
    })
    .unwrap();

    let view = repo.fetch(7).unwrap();
    assert_eq!(view.memo, "deposit");
    assert_eq!(view.settled.as_deref(), Some("false"));
    assert_eq!(entry_counts(&connection).0, 1);
}

#[test]
fn string_key_with_hashed_field_round_trips() {
    let mut connection = migrated();
    let mut repo = HolderRepo::new(&mut connection);
    repo.save(&HolderRecord {
        holder_id: "h_1".to_string(),
        ssn: "123-45-6789".to_string(),
        nickname: "Ada".to_string(),
    })
    .unwrap();

    let view = repo.fetch("h_1").unwrap();
    assert_eq!(view.holder_id, "h_1");
    assert_eq!(view.ssn, "123-45-6789");
    assert_eq!(view.hashed_ssn, Some(digest("123-45-6789")));
    assert_eq!(view.nickname.as_deref(), Some("Ada"));
}

#[test]
fn key_only_message_round_trips() {
    let mut connection = migrated();
    let mut repo = TagRepo::new(&mut connection);
    repo.save(&TagRecord {
        tag: "urgent".to_string(),
    })
    .unwrap();
    assert_eq!(repo.fetch("urgent").unwrap().tag, "urgent");
    assert_eq!(count(&connection, "SELECT COUNT(*) FROM \"TagChain\""), 0);
}

// ============================================================================
// SECTION: Not Found
// ============================================================================

#[test]
fn absent_keys_are_not_found() {
    let mut connection = migrated();
    let entry_err = EntryRepo::new(&mut connection).fetch(404).unwrap_err();
    assert_eq!(
        entry_err,
        RepositoryError::NotFound {
            table: "entry_view".to_string(),
            key: "404".to_string(),
        }
    );
    let holder_err = HolderRepo::new(&mut connection).fetch("missing").unwrap_err();
    assert_eq!(
        holder_err,
        RepositoryError::NotFound {
            table: "holder_view".to_string(),
            key: "missing".to_string(),
        }
    );
}

#[test]
fn uint64_beyond_sqlite_range_is_not_found_or_rejected() {
    let mut connection = migrated();
    let mut repo = EntryRepo::new(&mut connection);
    assert_eq!(
        repo.fetch(u64::MAX).unwrap_err(),
        RepositoryError::NotFound {
            table: "entry_view".to_string(),
            key: u64::MAX.to_string(),
        }
    );

    let err = repo
        .save(&EntryRecord {
            balance: u64::MAX,
            ..entry()
        })
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Record(ref message) if message.starts_with("balance:")));
    assert_eq!(entry_counts(&connection), (0, 0));
}

// ============================================================================
// SECTION: Atomicity
// ============================================================================

#[test]
fn failure_on_second_audit_insert_rolls_back_everything() {
    let mut connection = migrated();
    connection
        .execute_batch(
            "CREATE TRIGGER fail_second_audit BEFORE INSERT ON \"EntryChain\"
             WHEN (SELECT COUNT(*) FROM \"EntryChain\" WHERE \"key\" = NEW.\"key\") >= 1
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
        )
        .unwrap();

    let mut repo = EntryRepo::new(&mut connection);
    let err = repo.save(&entry()).unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Transaction(ref message) if message.contains("injected failure")
    ));
    assert!(matches!(repo.fetch(7), Err(RepositoryError::NotFound { .. })));
    assert_eq!(entry_counts(&connection), (0, 0));
}

// ============================================================================
// SECTION: Audit History
// ============================================================================

#[test]
fn two_saves_produce_twice_the_audit_rows() {
    let mut connection = migrated();
    let mut repo = EntryRepo::new(&mut connection);
    repo.save(&entry()).unwrap();
    repo.save(&entry()).unwrap();

    let per_save = ["entry_id", "memo", "hashed_units", "settled", "hashed_payload", "type"];
    assert_eq!(entry_counts(&connection), (1, 12));
    let names: Vec<String> = {
        let mut stmt = connection
            .prepare("SELECT \"field_name\" FROM \"EntryChain\" ORDER BY \"seq\"")
            .unwrap();
        stmt.query_map([], |row| row.get(0)).unwrap().map(Result::unwrap).collect()
    };
    assert_eq!(names[.. 6], per_save);
    assert_eq!(names[6 ..], per_save);
}

#[test]
fn audit_rows_reject_update_and_delete() {
    let mut connection = migrated();
    EntryRepo::new(&mut connection).save(&entry()).unwrap();
    assert!(connection.execute("UPDATE \"EntryChain\" SET \"field_value\" = 'x'", []).is_err());
    assert!(connection.execute("DELETE FROM \"EntryChain\"", []).is_err());
    assert_eq!(entry_counts(&connection), (1, 6));
}
