// crates/sdm-core/src/sql.rs
// ============================================================================
// Module: SDM SQL Statements
// Description: SQL text for the derived layout.
// Purpose: Give emitters and the runtime repository one statement source.
// Dependencies: crate::{descriptor, schema}
// ============================================================================

//! ## Overview
//! Renders the DDL and the three data statements (sensitive upsert, audit
//! insert, view select) for a [`DerivedSchemas`]. The SQL backend, the Rust
//! backend, and the runtime repository all embed these strings, so generated
//! code and the runtime agree exactly.
//!
//! Identifiers are validated upstream (see [`crate::naming::validate_identifier`])
//! and are always double-quoted here. The dialect targets `SQLite`; the
//! upsert and trigger forms are also accepted by `PostgreSQL` 15+ except for
//! `AUTOINCREMENT` and `RAISE`.

use std::fmt::Write;

use crate::descriptor::ValueType;
use crate::schema::AUDIT_FIELD_NAME_COLUMN;
use crate::schema::AUDIT_FIELD_VALUE_COLUMN;
use crate::schema::AUDIT_KEY_COLUMN;
use crate::schema::AUDIT_SEQ_COLUMN;
use crate::schema::AuditTableSchema;
use crate::schema::DerivedSchemas;
use crate::schema::SensitiveTableSchema;
use crate::schema::ViewSchema;
use crate::schema::ViewSource;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Error message raised by the append-only triggers.
pub const APPEND_ONLY_MESSAGE: &str = "audit rows are append-only";

// ============================================================================
// SECTION: Statement Set
// ============================================================================

/// All statements needed to migrate, write, and read one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statements {
    /// DDL for the sensitive table, audit table, triggers, and view.
    pub schema: String,
    /// Sensitive row upsert; parameters follow sensitive column order.
    pub upsert_sensitive: String,
    /// Audit row insert; parameters are `(key, field_name, field_value)`.
    pub insert_audit: String,
    /// View select by primary key; one parameter.
    pub select_view: String,
}

impl Statements {
    /// Renders every statement for the derived schemas.
    #[must_use]
    pub fn for_schemas(schemas: &DerivedSchemas) -> Self {
        Self {
            schema: schema_ddl(schemas),
            upsert_sensitive: upsert_sensitive(&schemas.sensitive),
            insert_audit: insert_audit(&schemas.audit),
            select_view: select_view(&schemas.view),
        }
    }
}

// ============================================================================
// SECTION: DDL
// ============================================================================

/// Returns the SQL column type for a value type.
#[must_use]
pub const fn sql_type(ty: ValueType) -> &'static str {
    match ty {
        ValueType::String => "TEXT",
        ValueType::Int32
        | ValueType::Int64
        | ValueType::Uint32
        | ValueType::Uint64
        | ValueType::Enum => "INTEGER",
        ValueType::Bool => "BOOLEAN",
        ValueType::Float | ValueType::Double => "REAL",
        ValueType::Bytes | ValueType::Message => "BLOB",
    }
}

/// Renders the full DDL for one message.
#[must_use]
pub fn schema_ddl(schemas: &DerivedSchemas) -> String {
    let mut out = String::new();
    out.push_str(&create_sensitive_table(&schemas.sensitive));
    out.push('\n');
    out.push_str(&create_audit_table(&schemas.audit));
    out.push('\n');
    out.push_str(&create_view(&schemas.view));
    out
}

/// Renders `CREATE TABLE` for the sensitive table.
#[must_use]
pub fn create_sensitive_table(table: &SensitiveTableSchema) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "CREATE TABLE IF NOT EXISTS {} (", quote(&table.table));
    let count = table.columns.len();
    for (idx, column) in table.columns.iter().enumerate() {
        let _ = write!(out, "    {} {} NOT NULL", quote(&column.name), sql_type(column.ty));
        if column.name == table.key {
            out.push_str(" PRIMARY KEY");
        }
        out.push_str(if idx + 1 == count { "\n" } else { ",\n" });
    }
    out.push_str(");\n");
    out
}

/// Renders `CREATE TABLE`, index, and append-only triggers for the audit table.
#[must_use]
pub fn create_audit_table(table: &AuditTableSchema) -> String {
    let name = quote(&table.table);
    let mut out = String::new();
    let _ = writeln!(out, "CREATE TABLE IF NOT EXISTS {name} (");
    let _ = writeln!(out, "    {} INTEGER PRIMARY KEY AUTOINCREMENT,", quote(AUDIT_SEQ_COLUMN));
    let _ = writeln!(out, "    {} TEXT NOT NULL,", quote(AUDIT_KEY_COLUMN));
    let _ = writeln!(out, "    {} TEXT NOT NULL,", quote(AUDIT_FIELD_NAME_COLUMN));
    let _ = writeln!(out, "    {} TEXT NOT NULL", quote(AUDIT_FIELD_VALUE_COLUMN));
    out.push_str(");\n");
    let _ = writeln!(
        out,
        "CREATE INDEX IF NOT EXISTS {} ON {name} ({}, {}, {});",
        quote(&format!("{}_key_field", table.table)),
        quote(AUDIT_KEY_COLUMN),
        quote(AUDIT_FIELD_NAME_COLUMN),
        quote(AUDIT_SEQ_COLUMN)
    );
    for (suffix, event) in [("no_update", "UPDATE"), ("no_delete", "DELETE")] {
        let _ = writeln!(
            out,
            "CREATE TRIGGER IF NOT EXISTS {} BEFORE {event} ON {name}\nBEGIN\n    SELECT \
             RAISE(ABORT, '{APPEND_ONLY_MESSAGE}');\nEND;",
            quote(&format!("{}_{suffix}", table.table))
        );
    }
    out
}

/// Renders `CREATE VIEW` joining the sensitive row with the latest audit rows.
#[must_use]
pub fn create_view(view: &ViewSchema) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "CREATE VIEW IF NOT EXISTS {} AS", quote(&view.name));
    out.push_str("SELECT\n");
    let key_expr = audit_key_expr(view);
    let count = view.columns.len();
    for (idx, column) in view.columns.iter().enumerate() {
        match &column.source {
            ViewSource::Sensitive {
                column: source, ..
            } => {
                let _ = write!(out, "    p.{} AS {}", quote(source), quote(&column.name));
            }
            ViewSource::Audit {
                field_name,
            } => {
                let _ = write!(
                    out,
                    "    (SELECT c.{value} FROM {audit} c WHERE c.{key} = {key_expr} AND c.{name} \
                     = '{field_name}' ORDER BY c.{seq} DESC LIMIT 1) AS {alias}",
                    value = quote(AUDIT_FIELD_VALUE_COLUMN),
                    audit = quote(&view.audit_table),
                    key = quote(AUDIT_KEY_COLUMN),
                    name = quote(AUDIT_FIELD_NAME_COLUMN),
                    seq = quote(AUDIT_SEQ_COLUMN),
                    alias = quote(&column.name),
                );
            }
        }
        out.push_str(if idx + 1 == count { "\n" } else { ",\n" });
    }
    let _ = writeln!(out, "FROM {} p;", quote(&view.sensitive_table));
    out
}

/// Returns the expression matching the audit `key` column to the sensitive key.
///
/// Integer keys are rendered as text, matching their canonical rendering.
fn audit_key_expr(view: &ViewSchema) -> String {
    if view.key_type.is_integer() {
        format!("CAST(p.{} AS TEXT)", quote(&view.key))
    } else {
        format!("p.{}", quote(&view.key))
    }
}

// ============================================================================
// SECTION: Data Statements
// ============================================================================

/// Renders the sensitive row upsert.
///
/// Later saves of the same key overwrite the non-key columns.
#[must_use]
pub fn upsert_sensitive(table: &SensitiveTableSchema) -> String {
    let names: Vec<String> = table.columns.iter().map(|column| quote(&column.name)).collect();
    let params: Vec<String> = (1 ..= table.columns.len()).map(|idx| format!("?{idx}")).collect();
    let mut out = format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO ",
        quote(&table.table),
        names.join(", "),
        params.join(", "),
        quote(&table.key)
    );
    let updates: Vec<String> = table
        .value_columns()
        .map(|column| format!("{name} = excluded.{name}", name = quote(&column.name)))
        .collect();
    if updates.is_empty() {
        out.push_str("NOTHING");
    } else {
        out.push_str("UPDATE SET ");
        out.push_str(&updates.join(", "));
    }
    out
}

/// Renders the audit row insert.
#[must_use]
pub fn insert_audit(table: &AuditTableSchema) -> String {
    format!(
        "INSERT INTO {} ({}, {}, {}) VALUES (?1, ?2, ?3)",
        quote(&table.table),
        quote(AUDIT_KEY_COLUMN),
        quote(AUDIT_FIELD_NAME_COLUMN),
        quote(AUDIT_FIELD_VALUE_COLUMN)
    )
}

/// Renders the view select by primary key; columns follow view order.
#[must_use]
pub fn select_view(view: &ViewSchema) -> String {
    let names: Vec<String> = view.columns.iter().map(|column| quote(&column.name)).collect();
    format!(
        "SELECT {} FROM {} WHERE {} = ?1",
        names.join(", "),
        quote(&view.name),
        quote(&view.key)
    )
}

/// Renders the audit history select for one key, oldest first.
#[must_use]
pub fn select_audit_history(table: &AuditTableSchema) -> String {
    format!(
        "SELECT {seq}, {name}, {value} FROM {table} WHERE {key} = ?1 ORDER BY {seq} ASC",
        seq = quote(AUDIT_SEQ_COLUMN),
        name = quote(AUDIT_FIELD_NAME_COLUMN),
        value = quote(AUDIT_FIELD_VALUE_COLUMN),
        table = quote(&table.table),
        key = quote(AUDIT_KEY_COLUMN)
    )
}

/// Double-quotes an identifier.
#[must_use]
pub fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}
