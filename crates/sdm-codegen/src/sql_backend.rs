// crates/sdm-codegen/src/sql_backend.rs
// ============================================================================
// Module: SDM SQL Backend
// Description: DDL emitter for derived schemas.
// Purpose: Produce a migration script covering every message of a file.
// Dependencies: sdm-core
// ============================================================================

//! ## Overview
//! One `<stem>.sdm.sql` per schema file, each message introduced by a
//! `-- Message:` line. Statements use `IF NOT EXISTS`, so the script can be
//! re-run against an existing database.

use sdm_core::DerivedSchemas;
use sdm_core::sql;

use crate::backend::Backend;

/// Emits `CREATE TABLE`, trigger, and `CREATE VIEW` statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlBackend;

impl Backend for SqlBackend {
    fn suffix(&self) -> &'static str {
        ".sdm.sql"
    }

    fn comment(&self) -> &'static str {
        "--"
    }

    fn render_message(&self, schemas: &DerivedSchemas) -> String {
        format!("-- Message: {}\n{}", schemas.message, sql::schema_ddl(schemas))
    }
}
