// crates/sdm-store-sqlite/src/repository.rs
// ============================================================================
// Module: SDM SQLite Repository
// Description: Atomic save and view-based fetch for one derived message.
// Purpose: Execute the split-table write contract against SQLite.
// Dependencies: sdm-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! A save is prepared first (values checked against declared types, audit
//! rows rendered, digests computed) and then applied inside one transaction:
//! upsert the sensitive row, append one audit row per audited entry, commit.
//! Any error before commit drops the transaction, which rolls back every
//! statement already executed. Failures are returned unchanged.
//!
//! Fetch reads the view by primary key and distinguishes an absent key
//! ([`RepositoryError::NotFound`]) from storage failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::ToSql;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::Type;
use rusqlite::types::Value;
use rusqlite::types::ValueRef;
use sdm_core::AuditValue;
use sdm_core::DerivedSchemas;
use sdm_core::FieldValue;
use sdm_core::MessageDescriptor;
use sdm_core::NamingConvention;
use sdm_core::SchemaError;
use sdm_core::ValueType;
use sdm_core::ViewSchema;
use sdm_core::ViewSource;
use sdm_core::derive;
use sdm_core::hashing::digest;
use sdm_core::hashing::verify_digest;
use sdm_core::render_value;
use sdm_core::sql;
use sdm_core::sql::Statements;
use tracing::debug;

use crate::error::RepositoryError;

// ============================================================================
// SECTION: Records
// ============================================================================

/// Field values of one logical record, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Values by field name.
    values: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record with `name` set to `value`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Sets a field value, returning the previous one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.values.insert(name.into(), value.into())
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Returns the value of a field required by the schema.
    fn require(&self, name: &str) -> Result<&FieldValue, RepositoryError> {
        self.get(name)
            .ok_or_else(|| RepositoryError::Record(format!("record is missing field {name}")))
    }
}

/// Merged projection returned by a fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRecord {
    /// Sensitive columns, including the primary key.
    sensitive: BTreeMap<String, FieldValue>,
    /// Latest audit value per audit column; `None` when no row exists yet.
    audit: BTreeMap<String, Option<String>>,
}

impl ViewRecord {
    /// Returns a sensitive column value.
    #[must_use]
    pub fn sensitive(&self, name: &str) -> Option<&FieldValue> {
        self.sensitive.get(name)
    }

    /// Returns the latest audit value of an audit column.
    #[must_use]
    pub fn audit(&self, name: &str) -> Option<&str> {
        self.audit.get(name).and_then(Option::as_deref)
    }

    /// Returns the number of projected columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sensitive.len() + self.audit.len()
    }

    /// Returns true when the projection has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One stored audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRow {
    /// Write sequence number.
    pub seq: i64,
    /// Audit row name.
    pub field_name: String,
    /// Plaintext or digest value.
    pub field_value: String,
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// Runtime repository for one derived message.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    /// Derived schemas for the message.
    schemas: DerivedSchemas,
    /// Statements rendered from the schemas.
    statements: Statements,
    /// Audit history select.
    history_sql: String,
}

/// Save payload validated and rendered outside the transaction.
#[derive(Debug)]
struct PreparedSave<'a> {
    /// Rendered primary key for the audit `key` column.
    key_text: String,
    /// Sensitive parameters in column order.
    sensitive: Vec<&'a FieldValue>,
    /// `(field_name, field_value)` audit rows in entry order.
    audit_rows: Vec<(&'a str, String)>,
}

impl SqliteRepository {
    /// Creates a repository for already derived schemas.
    #[must_use]
    pub fn new(schemas: DerivedSchemas) -> Self {
        let statements = Statements::for_schemas(&schemas);
        let history_sql = sql::select_audit_history(&schemas.audit);
        Self {
            schemas,
            statements,
            history_sql,
        }
    }

    /// Derives the schemas for `message` and creates a repository.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the message cannot be derived.
    pub fn from_message(
        message: &MessageDescriptor,
        naming: &dyn NamingConvention,
    ) -> Result<Self, SchemaError> {
        Ok(Self::new(derive(message, naming)?))
    }

    /// Returns the derived schemas.
    #[must_use]
    pub const fn schemas(&self) -> &DerivedSchemas {
        &self.schemas
    }

    /// Returns the rendered statements.
    #[must_use]
    pub const fn statements(&self) -> &Statements {
        &self.statements
    }

    /// Creates the tables, triggers, and view if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Db`] when the DDL fails.
    pub fn migrate(&self, connection: &Connection) -> Result<(), RepositoryError> {
        connection
            .execute_batch(&self.statements.schema)
            .map_err(|err| RepositoryError::Db(err.to_string()))
    }

    /// Saves a record atomically.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Record`] or [`RepositoryError::Hash`] before
    /// any write when the record does not fit the schema, and
    /// [`RepositoryError::Transaction`] when a statement or the commit fails.
    pub fn save(&self, connection: &mut Connection, record: &Record) -> Result<(), RepositoryError> {
        let prepared = self.prepare_save(record)?;
        let tx =
            connection.transaction().map_err(|err| RepositoryError::Transaction(err.to_string()))?;
        self.apply_prepared_save_in_tx(&tx, &prepared)?;
        tx.commit().map_err(|err| RepositoryError::Transaction(err.to_string()))?;
        debug!(
            message = %self.schemas.message,
            table = %self.schemas.sensitive.table,
            audit_rows = prepared.audit_rows.len(),
            "saved record"
        );
        Ok(())
    }

    /// Validates and renders a record.
    fn prepare_save<'a>(&'a self, record: &'a Record) -> Result<PreparedSave<'a>, RepositoryError> {
        let key = record.require(self.schemas.key())?;
        let key_text = render_value(self.schemas.key(), self.schemas.key_type(), key)?;

        let mut sensitive = Vec::with_capacity(self.schemas.sensitive.columns.len());
        for column in &self.schemas.sensitive.columns {
            let value = record.require(&column.name)?;
            render_value(&column.name, column.ty, value)?;
            if !fits_sqlite_integer(value) {
                return Err(RepositoryError::Record(format!(
                    "{}: value exceeds the sqlite integer range",
                    column.name
                )));
            }
            sensitive.push(value);
        }

        let mut audit_rows = Vec::with_capacity(self.schemas.audit.entries.len());
        for entry in &self.schemas.audit.entries {
            let rendered = render_value(&entry.field, entry.ty, record.require(&entry.field)?)?;
            let stored = match entry.value {
                AuditValue::Plaintext => rendered,
                AuditValue::Digest => digest(&rendered),
            };
            audit_rows.push((entry.field_name.as_str(), stored));
        }

        Ok(PreparedSave {
            key_text,
            sensitive,
            audit_rows,
        })
    }

    /// Executes a prepared save inside an open transaction.
    fn apply_prepared_save_in_tx(
        &self,
        tx: &Transaction<'_>,
        prepared: &PreparedSave<'_>,
    ) -> Result<(), RepositoryError> {
        tx.execute(
            &self.statements.upsert_sensitive,
            params_from_iter(prepared.sensitive.iter().copied().map(SqlParam)),
        )
        .map_err(|err| RepositoryError::Transaction(err.to_string()))?;
        let mut insert = tx
            .prepare_cached(&self.statements.insert_audit)
            .map_err(|err| RepositoryError::Transaction(err.to_string()))?;
        for (field_name, field_value) in &prepared.audit_rows {
            insert
                .execute(params![prepared.key_text, field_name, field_value])
                .map_err(|err| RepositoryError::Transaction(err.to_string()))?;
        }
        Ok(())
    }

    /// Reads the merged projection for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no sensitive row exists
    /// (including a `uint64` key too large to have been stored),
    /// [`RepositoryError::Hash`] when `key` does not match the key type, and
    /// [`RepositoryError::Read`] on storage failures.
    pub fn fetch(
        &self,
        connection: &Connection,
        key: &FieldValue,
    ) -> Result<ViewRecord, RepositoryError> {
        let key_text = render_value(self.schemas.key(), self.schemas.key_type(), key)?;
        let view = &self.schemas.view;
        if !fits_sqlite_integer(key) {
            return Err(RepositoryError::NotFound {
                table: view.name.clone(),
                key: key_text,
            });
        }
        let record = connection
            .query_row(&self.statements.select_view, [SqlParam(key)], |row| {
                read_view_row(row, view)
            })
            .optional()
            .map_err(|err| RepositoryError::Read(err.to_string()))?;
        debug!(
            message = %self.schemas.message,
            view = %view.name,
            found = record.is_some(),
            "fetched record"
        );
        record.ok_or_else(|| RepositoryError::NotFound {
            table: view.name.clone(),
            key: key_text,
        })
    }

    /// Returns every audit row for `key`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Hash`] when `key` does not match the key
    /// type and [`RepositoryError::Read`] on storage failures.
    pub fn audit_history(
        &self,
        connection: &Connection,
        key: &FieldValue,
    ) -> Result<Vec<AuditRow>, RepositoryError> {
        let key_text = render_value(self.schemas.key(), self.schemas.key_type(), key)?;
        let mut stmt = connection
            .prepare_cached(&self.history_sql)
            .map_err(|err| RepositoryError::Read(err.to_string()))?;
        let rows = stmt
            .query_map(params![key_text], |row| {
                Ok(AuditRow {
                    seq: row.get(0)?,
                    field_name: row.get(1)?,
                    field_value: row.get(2)?,
                })
            })
            .map_err(|err| RepositoryError::Read(err.to_string()))?;
        let mut history = Vec::new();
        for row in rows {
            history.push(row.map_err(|err| RepositoryError::Read(err.to_string()))?);
        }
        Ok(history)
    }

    /// Checks a claimed plaintext against the latest audit row of a field.
    ///
    /// Hashed entries are verified by recomputing the digest; plaintext
    /// entries by comparing the canonical rendering.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Record`] when `field` is not audited,
    /// [`RepositoryError::NotFound`] when no audit row exists for the key, and
    /// rendering or read errors otherwise.
    pub fn verify_audit_value(
        &self,
        connection: &Connection,
        key: &FieldValue,
        field: &str,
        claimed: &FieldValue,
    ) -> Result<bool, RepositoryError> {
        let entry = self
            .schemas
            .audit
            .entries
            .iter()
            .find(|entry| entry.field == field)
            .ok_or_else(|| RepositoryError::Record(format!("field {field} is not audited")))?;
        let rendered = render_value(&entry.field, entry.ty, claimed)?;
        let history = self.audit_history(connection, key)?;
        let Some(latest) = history.iter().rev().find(|row| row.field_name == entry.field_name)
        else {
            return Err(RepositoryError::NotFound {
                table: self.schemas.audit.table.clone(),
                key: render_value(self.schemas.key(), self.schemas.key_type(), key)?,
            });
        };
        Ok(match entry.value {
            AuditValue::Plaintext => latest.field_value == rendered,
            AuditValue::Digest => verify_digest(&rendered, &latest.field_value),
        })
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Builds a [`ViewRecord`] from a view row in column order.
fn read_view_row(row: &Row<'_>, view: &ViewSchema) -> rusqlite::Result<ViewRecord> {
    let mut sensitive = BTreeMap::new();
    let mut audit = BTreeMap::new();
    for (idx, column) in view.columns.iter().enumerate() {
        match &column.source {
            ViewSource::Sensitive {
                ty, ..
            } => {
                sensitive.insert(column.name.clone(), read_typed(row, idx, *ty)?);
            }
            ViewSource::Audit {
                ..
            } => {
                audit.insert(column.name.clone(), row.get::<_, Option<String>>(idx)?);
            }
        }
    }
    Ok(ViewRecord {
        sensitive,
        audit,
    })
}

/// Reads one column as the value type it was declared with.
fn read_typed(row: &Row<'_>, idx: usize, ty: ValueType) -> rusqlite::Result<FieldValue> {
    Ok(match ty {
        ValueType::String => FieldValue::Text(row.get(idx)?),
        ValueType::Int32 | ValueType::Enum => FieldValue::I32(row.get(idx)?),
        ValueType::Int64 => FieldValue::I64(row.get(idx)?),
        ValueType::Uint32 => FieldValue::U32(row.get(idx)?),
        ValueType::Uint64 => {
            let raw: i64 = row.get(idx)?;
            let value = u64::try_from(raw).map_err(|err| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(err))
            })?;
            FieldValue::U64(value)
        }
        ValueType::Bool => FieldValue::Bool(row.get(idx)?),
        ValueType::Float => FieldValue::F32(narrow_float(row.get(idx)?)),
        ValueType::Double => FieldValue::F64(row.get(idx)?),
        ValueType::Bytes => FieldValue::Bytes(row.get(idx)?),
        ValueType::Message => {
            return Err(rusqlite::Error::InvalidColumnType(
                idx,
                ty.as_str().to_string(),
                Type::Blob,
            ));
        }
    })
}

/// Narrows a stored `REAL` back to the `f32` it was written from.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Float columns only ever hold values widened from f32."
)]
const fn narrow_float(value: f64) -> f32 {
    value as f32
}

/// Returns false for a `uint64` value above `i64::MAX`, which `SQLite` cannot
/// store as an integer.
fn fits_sqlite_integer(value: &FieldValue) -> bool {
    match value {
        FieldValue::U64(value) => i64::try_from(*value).is_ok(),
        _ => true,
    }
}

/// Binds a [`FieldValue`] as a `SQLite` parameter.
struct SqlParam<'a>(&'a FieldValue);

impl ToSql for SqlParam<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            FieldValue::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
            FieldValue::I32(value) => ToSqlOutput::Owned(Value::Integer(i64::from(*value))),
            FieldValue::I64(value) => ToSqlOutput::Owned(Value::Integer(*value)),
            FieldValue::U32(value) => ToSqlOutput::Owned(Value::Integer(i64::from(*value))),
            FieldValue::U64(value) => {
                let value = i64::try_from(*value)
                    .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
                ToSqlOutput::Owned(Value::Integer(value))
            }
            FieldValue::Bool(value) => ToSqlOutput::Owned(Value::Integer(i64::from(*value))),
            FieldValue::F32(value) => ToSqlOutput::Owned(Value::Real(f64::from(*value))),
            FieldValue::F64(value) => ToSqlOutput::Owned(Value::Real(*value)),
            FieldValue::Bytes(value) => ToSqlOutput::Borrowed(ValueRef::Blob(value)),
        })
    }
}
