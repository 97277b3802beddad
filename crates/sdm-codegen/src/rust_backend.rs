// crates/sdm-codegen/src/rust_backend.rs
// ============================================================================
// Module: SDM Rust Backend
// Description: Repository emitter targeting rusqlite.
// Purpose: Generate typed records, views, and atomic save/fetch code.
// Dependencies: sdm-core, crate::backend
// ============================================================================

//! ## Overview
//! For each message the backend emits:
//! - `<Message>Record`: every storable field, typed.
//! - `<Message>View`: sensitive columns typed, audit columns as
//!   `Option<String>` (absent until the first save writes them).
//! - `<Message>Repo<'c>`: holds only the caller's `&mut Connection` and
//!   exposes `migrate`, `save`, and `fetch`.
//!
//! `save` runs in one transaction: upsert the sensitive row, insert one audit
//! row per audited entry in declaration order, commit. Early returns drop the
//! transaction, which rolls it back. No retries are generated.
//!
//! SQLite integers are signed, so `uint64` values bind and read through a
//! checked `i64` conversion, matching the runtime repository.
//!
//! Generated code depends on `rusqlite`, `sdm-core` (canonical rendering and
//! digests), and `sdm-store-sqlite` (the shared `RepositoryError`). SQL text
//! comes from [`sdm_core::sql`], so it matches the runtime repository.

use std::fmt::Write;

use sdm_core::AuditValue;
use sdm_core::DerivedSchemas;
use sdm_core::SchemaFile;
use sdm_core::ValueType;
use sdm_core::ViewSource;
use sdm_core::naming::pascal_case;
use sdm_core::sql::Statements;

use crate::backend::Backend;

// ============================================================================
// SECTION: Backend
// ============================================================================

/// Emits rusqlite repositories.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend;

impl Backend for RustBackend {
    fn suffix(&self) -> &'static str {
        "_sdm_repo.rs"
    }

    fn comment(&self) -> &'static str {
        "//"
    }

    fn render_preamble(&self, _file: &SchemaFile) -> String {
        [
            "",
            "use rusqlite::Connection;",
            "use rusqlite::OptionalExtension;",
            "use rusqlite::params;",
            "use sdm_core::value::Canonical;",
            "use sdm_store_sqlite::RepositoryError;",
            "",
        ]
        .join("\n")
    }

    fn render_message(&self, schemas: &DerivedSchemas) -> String {
        let names = TypeNames::new(&schemas.message);
        let statements = Statements::for_schemas(schemas);
        let mut out = String::new();
        render_record(&mut out, schemas, &names);
        out.push('\n');
        render_view(&mut out, schemas, &names);
        out.push('\n');
        render_repo(&mut out, schemas, &names, &statements);
        out
    }
}

/// Generated type names for one message.
struct TypeNames {
    /// Record struct name.
    record: String,
    /// View struct name.
    view: String,
    /// Repository struct name.
    repo: String,
}

impl TypeNames {
    /// Derives type names from the message name.
    fn new(message: &str) -> Self {
        let base = pascal_case(message);
        Self {
            record: format!("{base}Record"),
            view: format!("{base}View"),
            repo: format!("{base}Repo"),
        }
    }
}

// ============================================================================
// SECTION: Structs
// ============================================================================

/// Renders the record struct.
fn render_record(out: &mut String, schemas: &DerivedSchemas, names: &TypeNames) {
    let _ = writeln!(out, "/// Record of `{}`.", schemas.message);
    out.push_str("#[derive(Debug, Clone, PartialEq)]\n");
    let _ = writeln!(out, "pub struct {} {{", names.record);
    for column in &schemas.record {
        let _ = writeln!(out, "    /// `{}` ({}).", column.name, column.ty);
        let _ = writeln!(out, "    pub {}: {},", rust_ident(&column.name), rust_type(column.ty));
    }
    out.push_str("}\n");
}

/// Renders the view struct.
fn render_view(out: &mut String, schemas: &DerivedSchemas, names: &TypeNames) {
    let _ = writeln!(
        out,
        "/// Merged projection of `{}` read from `{}`.",
        schemas.message, schemas.view.name
    );
    out.push_str("#[derive(Debug, Clone, PartialEq)]\n");
    let _ = writeln!(out, "pub struct {} {{", names.view);
    for column in &schemas.view.columns {
        let ty = match &column.source {
            ViewSource::Sensitive {
                ty, ..
            } => rust_type(*ty).to_string(),
            ViewSource::Audit {
                ..
            } => "Option<String>".to_string(),
        };
        let _ = writeln!(out, "    /// `{}`.", column.name);
        let _ = writeln!(out, "    pub {}: {ty},", rust_ident(&column.name));
    }
    out.push_str("}\n");
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// Renders the repository struct and its methods.
fn render_repo(
    out: &mut String,
    schemas: &DerivedSchemas,
    names: &TypeNames,
    statements: &Statements,
) {
    let repo = &names.repo;
    let _ = writeln!(
        out,
        "/// Repository for `{}` over `{}`, `{}`, and `{}`.",
        schemas.message, schemas.sensitive.table, schemas.audit.table, schemas.view.name
    );
    out.push_str("#[derive(Debug)]\n");
    let _ = writeln!(out, "pub struct {repo}<'c> {{");
    out.push_str("    /// Caller-owned connection.\n");
    out.push_str("    conn: &'c mut Connection,\n");
    out.push_str("}\n\n");
    let _ = writeln!(out, "impl<'c> {repo}<'c> {{");
    out.push_str("    /// DDL for the sensitive table, audit table, triggers, and view.\n");
    push_const(out, "pub const SCHEMA", &statements.schema);
    out.push_str("    /// Sensitive row upsert.\n");
    push_const(out, "const UPSERT_SENSITIVE", &statements.upsert_sensitive);
    out.push_str("    /// Audit row insert.\n");
    if schemas.audit.entries.is_empty() {
        out.push_str(
            "    #[allow(dead_code, reason = \"Key-only messages append no audit rows.\")]\n",
        );
    }
    push_const(out, "const INSERT_AUDIT", &statements.insert_audit);
    out.push_str("    /// View read by primary key.\n");
    push_const(out, "const SELECT_VIEW", &statements.select_view);
    out.push('\n');

    out.push_str("    /// Wraps a caller-supplied connection.\n");
    out.push_str("    pub fn new(conn: &'c mut Connection) -> Self {\n");
    out.push_str("        Self { conn }\n");
    out.push_str("    }\n\n");

    out.push_str("    /// Creates the tables, triggers, and view if they do not exist.\n");
    out.push_str("    pub fn migrate(&self) -> Result<(), RepositoryError> {\n");
    out.push_str("        self.conn\n");
    out.push_str("            .execute_batch(Self::SCHEMA)\n");
    out.push_str("            .map_err(|err| RepositoryError::Db(err.to_string()))\n");
    out.push_str("    }\n\n");

    render_save(out, schemas, names);
    out.push('\n');
    render_fetch(out, schemas, names);
    out.push_str("}\n");
}

/// Renders `save`.
///
/// `uint64` columns are narrowed to `i64` before the transaction opens, so an
/// unrepresentable value is rejected as a record error without touching storage.
fn render_save(out: &mut String, schemas: &DerivedSchemas, names: &TypeNames) {
    const TX_ERR: &str = ".map_err(|err| RepositoryError::Transaction(err.to_string()))";
    out.push_str("    /// Upserts the sensitive row and appends audit rows in one transaction.\n");
    let _ = writeln!(
        out,
        "    pub fn save(&mut self, record: &{}) -> Result<(), RepositoryError> {{",
        names.record
    );
    let audited = !schemas.audit.entries.is_empty();
    if audited {
        let _ = writeln!(out, "        let key = record.{}.canonical();", rust_ident(schemas.key()));
    }
    let mut params = Vec::with_capacity(schemas.sensitive.columns.len());
    for column in &schemas.sensitive.columns {
        let field = format!("record.{}", rust_ident(&column.name));
        if column.ty == ValueType::Uint64 {
            let local = narrowed_ident(&column.name);
            let _ = writeln!(out, "        let {local} = i64::try_from({field})");
            let _ = writeln!(
                out,
                "            .map_err(|err| RepositoryError::Record(format!(\"{}: {{err}}\")))?;",
                column.name
            );
            params.push(local);
        } else {
            params.push(field);
        }
    }
    let _ = writeln!(out, "        let tx = self.conn.transaction(){TX_ERR}?;");
    let _ = writeln!(
        out,
        "        tx.execute(Self::UPSERT_SENSITIVE, params![{}])",
        params.join(", ")
    );
    let _ = writeln!(out, "            {TX_ERR}?;");
    if audited {
        out.push_str("        {\n");
        let _ = writeln!(
            out,
            "            let mut insert = tx.prepare_cached(Self::INSERT_AUDIT){TX_ERR}?;"
        );
        for entry in &schemas.audit.entries {
            let rendered = format!("record.{}.canonical()", rust_ident(&entry.field));
            let value = match entry.value {
                AuditValue::Plaintext => rendered,
                AuditValue::Digest => format!("::sdm_core::hashing::digest(&{rendered})"),
            };
            let _ = writeln!(
                out,
                "            insert.execute(params![key, \"{}\", {value}]){TX_ERR}?;",
                entry.field_name
            );
        }
        out.push_str("        }\n");
    }
    let _ = writeln!(out, "        tx.commit(){TX_ERR}");
    out.push_str("    }\n");
}

/// Renders `fetch`.
///
/// A `uint64` key above `i64::MAX` cannot be stored, so it reports `NotFound`
/// without a query.
fn render_fetch(out: &mut String, schemas: &DerivedSchemas, names: &TypeNames) {
    out.push_str("    /// Reads the merged projection for `key` from the view.\n");
    let _ = writeln!(
        out,
        "    pub fn fetch(&self, key: {}) -> Result<{}, RepositoryError> {{",
        key_param_type(schemas.key_type()),
        names.view
    );
    out.push_str("        let not_found = || RepositoryError::NotFound {\n");
    let _ = writeln!(out, "            table: \"{}\".to_string(),", schemas.view.name);
    out.push_str("            key: key.canonical(),\n");
    out.push_str("        };\n");
    let bound = if schemas.key_type() == ValueType::Uint64 {
        out.push_str("        let Ok(sql_key) = i64::try_from(key) else {\n");
        out.push_str("            return Err(not_found());\n");
        out.push_str("        };\n");
        "sql_key"
    } else {
        "key"
    };
    out.push_str("        self.conn\n");
    let _ = writeln!(out, "            .query_row(Self::SELECT_VIEW, params![{bound}], |row| {{");
    let _ = writeln!(out, "                Ok({} {{", names.view);
    for (idx, column) in schemas.view.columns.iter().enumerate() {
        let name = rust_ident(&column.name);
        match &column.source {
            ViewSource::Sensitive {
                ty: ValueType::Uint64,
                ..
            } => {
                let _ = writeln!(
                    out,
                    "                    {name}: u64::try_from(row.get::<_, i64>({idx})?).map_err(|err| {{"
                );
                let _ = writeln!(
                    out,
                    "                        ::rusqlite::Error::FromSqlConversionFailure({idx}, \
                     ::rusqlite::types::Type::Integer, Box::new(err))"
                );
                out.push_str("                    })?,\n");
            }
            _ => {
                let _ = writeln!(out, "                    {name}: row.get({idx})?,");
            }
        }
    }
    out.push_str("                })\n");
    out.push_str("            })\n");
    out.push_str("            .optional()\n");
    out.push_str("            .map_err(|err| RepositoryError::Read(err.to_string()))?\n");
    out.push_str("            .ok_or_else(not_found)\n");
    out.push_str("    }\n");
}

/// Writes an associated string constant as a raw string literal.
fn push_const(out: &mut String, decl: &str, sql: &str) {
    let _ = writeln!(out, "    {decl}: &'static str = r#\"{}\"#;", sql.trim_end());
}

// ============================================================================
// SECTION: Type Mapping
// ============================================================================

/// Returns the Rust type for a value type.
const fn rust_type(ty: ValueType) -> &'static str {
    match ty {
        ValueType::String => "String",
        ValueType::Int32 | ValueType::Enum => "i32",
        ValueType::Int64 => "i64",
        ValueType::Uint32 => "u32",
        ValueType::Uint64 => "u64",
        ValueType::Bool => "bool",
        ValueType::Float => "f32",
        ValueType::Double => "f64",
        ValueType::Bytes | ValueType::Message => "Vec<u8>",
    }
}

/// Returns the parameter type used for a primary key argument.
const fn key_param_type(ty: ValueType) -> &'static str {
    match ty {
        ValueType::String => "&str",
        other => rust_type(other),
    }
}

/// Rust keywords that must be written as raw identifiers.
const RAW_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do", "dyn",
    "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in", "let",
    "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return",
    "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized", "use",
    "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const RESERVED_PATH_KEYWORDS: &[&str] = &["crate", "self", "Self", "super", "_"];

/// Returns the local bound to a field narrowed for SQLite.
fn narrowed_ident(name: &str) -> String {
    format!("sql_{name}")
}

/// Returns a Rust-safe identifier for a field name.
fn rust_ident(name: &str) -> String {
    if RESERVED_PATH_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else if RAW_KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}
