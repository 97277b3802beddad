// crates/sdm-core/tests/sql.rs
// ============================================================================
// Module: SQL Statement Tests
// Description: Rendered DDL and data statements for derived schemas.
// Purpose: Pin the statement text shared by emitters and the repository.
// Dependencies: sdm-core
// ============================================================================

//! ## Overview
//! Snapshot-style assertions over [`sdm_core::sql`] output.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use sdm_core::DefaultNaming;
use sdm_core::FieldDescriptor;
use sdm_core::MessageDescriptor;
use sdm_core::ValueType;
use sdm_core::derive;
use sdm_core::sql;
use sdm_core::sql::Statements;

fn user_statements() -> Statements {
    let message = MessageDescriptor::new(
        "User",
        vec![
            FieldDescriptor::new("id", ValueType::String).primary_key().audited(),
            FieldDescriptor::new("ssn", ValueType::Int64).sensitive(),
            FieldDescriptor::new("address", ValueType::String).sensitive().hashed(),
            FieldDescriptor::new("name", ValueType::String).audited(),
        ],
    );
    Statements::for_schemas(&derive(&message, &DefaultNaming).unwrap())
}

#[test]
fn upsert_overwrites_value_columns() {
    assert_eq!(
        user_statements().upsert_sensitive,
        "INSERT INTO \"UserPii\" (\"id\", \"ssn\", \"address\") VALUES (?1, ?2, ?3) ON CONFLICT \
         (\"id\") DO UPDATE SET \"ssn\" = excluded.\"ssn\", \"address\" = excluded.\"address\""
    );
}

#[test]
fn key_only_upsert_does_nothing_on_conflict() {
    let message = MessageDescriptor::new(
        "Tag",
        vec![FieldDescriptor::new("id", ValueType::String).primary_key()],
    );
    let statements = Statements::for_schemas(&derive(&message, &DefaultNaming).unwrap());
    assert!(statements.upsert_sensitive.ends_with("ON CONFLICT (\"id\") DO NOTHING"));
    assert!(statements.schema.contains("CREATE TABLE IF NOT EXISTS \"TagChain\""));
}

#[test]
fn audit_insert_and_view_select() {
    let statements = user_statements();
    assert_eq!(
        statements.insert_audit,
        "INSERT INTO \"UserChain\" (\"key\", \"field_name\", \"field_value\") VALUES (?1, ?2, ?3)"
    );
    assert_eq!(
        statements.select_view,
        "SELECT \"id\", \"ssn\", \"address\", \"hashed_address\", \"name\" FROM \"user_view\" \
         WHERE \"id\" = ?1"
    );
}

#[test]
fn audit_table_is_guarded_by_triggers() {
    let ddl = user_statements().schema;
    assert!(ddl.contains("CREATE TRIGGER IF NOT EXISTS \"UserChain_no_update\" BEFORE UPDATE"));
    assert!(ddl.contains("CREATE TRIGGER IF NOT EXISTS \"UserChain_no_delete\" BEFORE DELETE"));
    assert!(ddl.contains(sql::APPEND_ONLY_MESSAGE));
    assert!(ddl.contains("\"seq\" INTEGER PRIMARY KEY AUTOINCREMENT"));
}

#[test]
fn view_reads_latest_audit_row() {
    let ddl = user_statements().schema;
    assert!(ddl.contains("CREATE VIEW IF NOT EXISTS \"user_view\" AS"));
    assert!(ddl.contains("c.\"field_name\" = 'hashed_address' ORDER BY c.\"seq\" DESC LIMIT 1"));
    assert!(ddl.contains("c.\"key\" = p.\"id\""));
}

#[test]
fn integer_keys_are_cast_for_audit_match() {
    let message = MessageDescriptor::new(
        "Account",
        vec![
            FieldDescriptor::new("account_id", ValueType::Int64).primary_key(),
            FieldDescriptor::new("holder", ValueType::String).audited(),
        ],
    );
    let schemas = derive(&message, &DefaultNaming).unwrap();
    let view = sql::create_view(&schemas.view);
    assert!(view.contains("c.\"key\" = CAST(p.\"account_id\" AS TEXT)"));
}

#[test]
fn sql_types_cover_storable_values() {
    assert_eq!(sql::sql_type(ValueType::String), "TEXT");
    assert_eq!(sql::sql_type(ValueType::Enum), "INTEGER");
    assert_eq!(sql::sql_type(ValueType::Bool), "BOOLEAN");
    assert_eq!(sql::sql_type(ValueType::Double), "REAL");
    assert_eq!(sql::sql_type(ValueType::Bytes), "BLOB");
}
