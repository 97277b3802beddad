// crates/sdm-core/src/schema.rs
// ============================================================================
// Module: SDM Schema Deriver
// Description: Derivation of the split physical layout from one message.
// Purpose: Produce the sensitive table, audit table, and view schemas.
// Dependencies: serde, crate::{classify, descriptor, error, hashing, naming}
// ============================================================================

//! ## Overview
//! [`derive`] turns a [`MessageDescriptor`] into [`DerivedSchemas`], the
//! intermediate representation every emitter backend and the runtime
//! repository consume:
//! - [`SensitiveTableSchema`]: primary key plus SENSITIVE fields, descriptor
//!   order, one row per record.
//! - [`AuditTableSchema`]: one entry per AUDITED field (plaintext) and per
//!   AUDITED_HASHED field (digest, under the hashed field name), descriptor
//!   order. Rows are append-only.
//! - [`ViewSchema`]: the sensitive row joined with the latest audit entry per
//!   `(key, field_name)`.
//!
//! Derived schemas are immutable once produced. A message with only a primary
//! key yields a key-only sensitive table and an empty audit schema.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::classify::AuditMode;
use crate::classify::ClassifiedMessage;
use crate::classify::classify_message;
use crate::descriptor::MessageDescriptor;
use crate::descriptor::ValueType;
use crate::error::SchemaError;
use crate::hashing::DEFAULT_HASH_ALGORITHM;
use crate::hashing::HashAlgorithm;
use crate::naming::NamingConvention;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Audit table column holding the write sequence number.
pub const AUDIT_SEQ_COLUMN: &str = "seq";
/// Audit table column holding the rendered primary key.
pub const AUDIT_KEY_COLUMN: &str = "key";
/// Audit table column holding the audit row name.
pub const AUDIT_FIELD_NAME_COLUMN: &str = "field_name";
/// Audit table column holding the plaintext or digest value.
pub const AUDIT_FIELD_VALUE_COLUMN: &str = "field_value";

// ============================================================================
// SECTION: Derived Schemas
// ============================================================================

/// A typed column of the sensitive table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (equal to the source field name).
    pub name: String,
    /// Declared value type.
    pub ty: ValueType,
}

/// Sensitive table: primary key plus SENSITIVE fields.
///
/// # Invariants
/// - `columns` contains the primary key exactly once.
/// - Column order follows descriptor order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveTableSchema {
    /// Table name.
    pub table: String,
    /// Primary key column name.
    pub key: String,
    /// Columns in descriptor order.
    pub columns: Vec<Column>,
}

impl SensitiveTableSchema {
    /// Returns the primary key column.
    #[must_use]
    pub fn key_column(&self) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == self.key)
    }

    /// Returns the non-key columns in order.
    pub fn value_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|column| column.name != self.key)
    }
}

/// How an audit entry's value is derived from its source field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditValue {
    /// Canonical plaintext rendering.
    Plaintext,
    /// Digest of the canonical rendering.
    Digest,
}

/// One audit row template: written once per save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Source field name.
    pub field: String,
    /// Value stored in the `field_name` column.
    pub field_name: String,
    /// Declared type of the source field.
    pub ty: ValueType,
    /// Plaintext or digest.
    pub value: AuditValue,
}

/// Append-only audit table with `(seq, key, field_name, field_value)` rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTableSchema {
    /// Table name.
    pub table: String,
    /// Type of the primary key rendered into the `key` column.
    pub key_type: ValueType,
    /// Row templates in descriptor order.
    pub entries: Vec<AuditEntry>,
}

impl AuditTableSchema {
    /// Returns true when no field is audited.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry stored under `field_name`.
    #[must_use]
    pub fn entry(&self, field_name: &str) -> Option<&AuditEntry> {
        self.entries.iter().find(|entry| entry.field_name == field_name)
    }
}

/// Where a view column reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewSource {
    /// A sensitive table column.
    Sensitive {
        /// Column name.
        column: String,
        /// Column type.
        ty: ValueType,
    },
    /// The latest audit row value for an audit row name.
    Audit {
        /// Audit row name.
        field_name: String,
    },
}

/// One column of the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewColumn {
    /// Column name in the view.
    pub name: String,
    /// Source of the value.
    pub source: ViewSource,
}

/// Read-only projection joining sensitive and audit data by primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSchema {
    /// View name.
    pub name: String,
    /// Joined sensitive table.
    pub sensitive_table: String,
    /// Joined audit table.
    pub audit_table: String,
    /// Primary key column.
    pub key: String,
    /// Type of the primary key column.
    pub key_type: ValueType,
    /// Sensitive columns first, then audit columns.
    pub columns: Vec<ViewColumn>,
}

/// The complete derivation of one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedSchemas {
    /// Source message name.
    pub message: String,
    /// Digest algorithm for hashed entries.
    pub hash_algorithm: HashAlgorithm,
    /// Record fields persisted or carried by generated code, descriptor order.
    pub record: Vec<Column>,
    /// Sensitive table schema.
    pub sensitive: SensitiveTableSchema,
    /// Audit table schema.
    pub audit: AuditTableSchema,
    /// View schema.
    pub view: ViewSchema,
}

impl DerivedSchemas {
    /// Returns the primary key column name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.sensitive.key
    }

    /// Returns the primary key type.
    #[must_use]
    pub const fn key_type(&self) -> ValueType {
        self.audit.key_type
    }
}

// ============================================================================
// SECTION: Derivation
// ============================================================================

/// Derives the three physical schemas for one message.
///
/// # Errors
///
/// Returns [`SchemaError`] when the message fails classification (see
/// [`classify_message`]), including a primary key whose type cannot be
/// rendered as a stable string.
///
/// # Examples
/// ```
/// use sdm_core::DefaultNaming;
/// use sdm_core::FieldDescriptor;
/// use sdm_core::MessageDescriptor;
/// use sdm_core::ValueType;
/// use sdm_core::derive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let message = MessageDescriptor::new(
///     "User",
///     vec![FieldDescriptor::new("id", ValueType::String).primary_key()],
/// );
/// let schemas = derive(&message, &DefaultNaming)?;
/// assert_eq!(schemas.sensitive.table, "UserPii");
/// assert!(schemas.audit.is_empty());
/// # Ok(())
/// # }
/// ```
pub fn derive(
    message: &MessageDescriptor,
    naming: &dyn NamingConvention,
) -> Result<DerivedSchemas, SchemaError> {
    let classified = classify_message(message, naming)?;
    Ok(derive_classified(&classified, naming))
}

/// Derives schemas from an already validated message.
#[must_use]
pub fn derive_classified(message: &ClassifiedMessage, naming: &dyn NamingConvention) -> DerivedSchemas {
    let key = message.primary_key();
    let sensitive_table = naming.sensitive_table(&message.name);
    let audit_table = naming.audit_table(&message.name);

    let record: Vec<Column> = message
        .fields()
        .iter()
        .filter(|field| field.ty.is_storable())
        .map(|field| Column {
            name: field.name.clone(),
            ty: field.ty,
        })
        .collect();

    let columns: Vec<Column> = message
        .fields()
        .iter()
        .filter(|field| field.classification.in_sensitive_table())
        .map(|field| Column {
            name: field.name.clone(),
            ty: field.ty,
        })
        .collect();

    let entries: Vec<AuditEntry> = message
        .fields()
        .iter()
        .filter_map(|field| {
            let (field_name, value) = match field.classification.audit {
                AuditMode::None => return None,
                AuditMode::Plaintext => (field.name.clone(), AuditValue::Plaintext),
                AuditMode::Hashed => (naming.hashed_field(&field.name), AuditValue::Digest),
            };
            Some(AuditEntry {
                field: field.name.clone(),
                field_name,
                ty: field.ty,
                value,
            })
        })
        .collect();

    let mut view_columns: Vec<ViewColumn> = columns
        .iter()
        .map(|column| ViewColumn {
            name: column.name.clone(),
            source: ViewSource::Sensitive {
                column: column.name.clone(),
                ty: column.ty,
            },
        })
        .collect();
    for entry in &entries {
        let echoed = entry.value == AuditValue::Plaintext
            && columns.iter().any(|column| column.name == entry.field);
        if echoed {
            continue;
        }
        view_columns.push(ViewColumn {
            name: entry.field_name.clone(),
            source: ViewSource::Audit {
                field_name: entry.field_name.clone(),
            },
        });
    }

    DerivedSchemas {
        message: message.name.clone(),
        hash_algorithm: DEFAULT_HASH_ALGORITHM,
        record,
        sensitive: SensitiveTableSchema {
            table: sensitive_table.clone(),
            key: key.name.clone(),
            columns,
        },
        audit: AuditTableSchema {
            table: audit_table.clone(),
            key_type: key.ty,
            entries,
        },
        view: ViewSchema {
            name: naming.view(&message.name),
            sensitive_table,
            audit_table,
            key: key.name.clone(),
            key_type: key.ty,
            columns: view_columns,
        },
    }
}
