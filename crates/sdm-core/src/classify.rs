// crates/sdm-core/src/classify.rs
// ============================================================================
// Module: SDM Field Classifier
// Description: Typed classification of governance annotations.
// Purpose: Compute each field's storage routing once and validate messages.
// Dependencies: crate::{descriptor, error, naming}
// ============================================================================

//! ## Overview
//! [`classify`] turns one field's annotations into a [`Classification`]. It is
//! pure and total: every field gets a classification, with PRIMARY_KEY and
//! SENSITIVE/AUDITED as independent axes. [`classify_message`] applies the
//! message-level rules: exactly one primary key of a key-capable type, no
//! duplicate fields, persistable types for tracked fields, and no collisions
//! among derived table, column, or audit row names.
//!
//! Name comparisons are ASCII case-insensitive because SQL identifiers are.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::descriptor::FieldDescriptor;
use crate::descriptor::MessageDescriptor;
use crate::descriptor::ValueType;
use crate::error::SchemaError;
use crate::naming::NamingConvention;
use crate::naming::validate_identifier;

// ============================================================================
// SECTION: Classification
// ============================================================================

/// One classification label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationTag {
    /// Primary key of the message.
    PrimaryKey,
    /// Column of the sensitive table.
    Sensitive,
    /// Plaintext audit entry.
    Audited,
    /// Digest audit entry.
    AuditedHashed,
    /// Not persisted by the generator.
    Plain,
}

impl fmt::Display for ClassificationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PrimaryKey => "PRIMARY_KEY",
            Self::Sensitive => "SENSITIVE",
            Self::Audited => "AUDITED",
            Self::AuditedHashed => "AUDITED_HASHED",
            Self::Plain => "PLAIN",
        })
    }
}

/// How a field is recorded in the audit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditMode {
    /// Not audited.
    None,
    /// Stored as its canonical plaintext rendering.
    Plaintext,
    /// Stored as the digest of its canonical rendering.
    Hashed,
}

/// Storage routing of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    /// Field is the primary key.
    pub primary_key: bool,
    /// Field is a sensitive table column.
    pub sensitive: bool,
    /// Audit routing.
    pub audit: AuditMode,
}

impl Classification {
    /// Returns true when the field is persisted nowhere.
    #[must_use]
    pub const fn is_plain(&self) -> bool {
        !self.primary_key && !self.sensitive && matches!(self.audit, AuditMode::None)
    }

    /// Returns true when the field is a sensitive table column.
    #[must_use]
    pub const fn in_sensitive_table(&self) -> bool {
        self.primary_key || self.sensitive
    }

    /// Returns the tags carried by the field, in canonical order.
    #[must_use]
    pub fn tags(&self) -> Vec<ClassificationTag> {
        if self.is_plain() {
            return vec![ClassificationTag::Plain];
        }
        let mut tags = Vec::with_capacity(3);
        if self.primary_key {
            tags.push(ClassificationTag::PrimaryKey);
        }
        if self.sensitive {
            tags.push(ClassificationTag::Sensitive);
        }
        match self.audit {
            AuditMode::None => {}
            AuditMode::Plaintext => tags.push(ClassificationTag::Audited),
            AuditMode::Hashed => tags.push(ClassificationTag::AuditedHashed),
        }
        tags
    }

    /// Returns true when the field carries `tag`.
    #[must_use]
    pub fn has(&self, tag: ClassificationTag) -> bool {
        self.tags().contains(&tag)
    }
}

/// Classifies one field from its annotations.
///
/// `hashed` takes precedence over `audited`: a field annotated with both is
/// recorded once, as a digest.
#[must_use]
pub const fn classify(field: &FieldDescriptor) -> Classification {
    let options = field.options;
    let audit = if options.hashed {
        AuditMode::Hashed
    } else if options.audited {
        AuditMode::Plaintext
    } else {
        AuditMode::None
    };
    Classification {
        primary_key: options.primary_key,
        sensitive: options.sensitive,
        audit,
    }
}

// ============================================================================
// SECTION: Classified Message
// ============================================================================

/// A field with its classification attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedField {
    /// Field name.
    pub name: String,
    /// Declared value type.
    pub ty: ValueType,
    /// Storage routing.
    pub classification: Classification,
}

/// A validated message whose fields carry classifications.
///
/// # Invariants
/// - Exactly one field is the primary key and its type is key-capable.
/// - Derived names do not collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedMessage {
    /// Message name.
    pub name: String,
    /// Fields in declaration order.
    fields: Vec<ClassifiedField>,
    /// Index of the primary key in `fields`.
    primary_key: usize,
}

impl ClassifiedMessage {
    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[ClassifiedField] {
        &self.fields
    }

    /// Returns the primary key field.
    #[must_use]
    pub fn primary_key(&self) -> &ClassifiedField {
        &self.fields[self.primary_key]
    }
}

/// Classifies every field of `message` and validates the message-level rules.
///
/// # Errors
///
/// Returns [`SchemaError`] on a missing or repeated primary key, a primary key
/// that cannot be rendered as a stable key, duplicate fields, unpersistable
/// tracked fields, invalid identifiers, or colliding derived names.
pub fn classify_message(
    message: &MessageDescriptor,
    naming: &dyn NamingConvention,
) -> Result<ClassifiedMessage, SchemaError> {
    let message_name = message.name.as_str();
    check_identifier(message_name, message_name)?;

    let mut seen = BTreeSet::new();
    let mut fields = Vec::with_capacity(message.fields.len());
    for field in &message.fields {
        check_identifier(message_name, &field.name)?;
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                message: message_name.to_string(),
                field: field.name.clone(),
            });
        }
        let classification = classify(field);
        if !classification.is_plain() && !field.ty.is_storable() {
            return Err(SchemaError::UnsupportedType {
                message: message_name.to_string(),
                field: field.name.clone(),
                ty: field.ty,
            });
        }
        fields.push(ClassifiedField {
            name: field.name.clone(),
            ty: field.ty,
            classification,
        });
    }

    let keys: Vec<usize> = fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.classification.primary_key)
        .map(|(idx, _)| idx)
        .collect();
    let primary_key = match keys.as_slice() {
        [] => {
            return Err(SchemaError::MissingPrimaryKey {
                message: message_name.to_string(),
            });
        }
        [single] => *single,
        many => {
            return Err(SchemaError::DuplicatePrimaryKey {
                message: message_name.to_string(),
                fields: many.iter().map(|idx| fields[*idx].name.clone()).collect(),
            });
        }
    };
    let key = &fields[primary_key];
    if !key.ty.is_key_capable() {
        return Err(SchemaError::UnrenderableKey {
            message: message_name.to_string(),
            field: key.name.clone(),
            ty: key.ty,
        });
    }

    check_table_names(message_name, naming)?;
    check_column_names(message_name, &fields, naming)?;

    Ok(ClassifiedMessage {
        name: message_name.to_string(),
        fields,
        primary_key,
    })
}

// ============================================================================
// SECTION: Name Checks
// ============================================================================

/// Validates one identifier in the context of a message.
fn check_identifier(message: &str, name: &str) -> Result<(), SchemaError> {
    validate_identifier(name).map_err(|reason| SchemaError::InvalidIdentifier {
        message: message.to_string(),
        name: name.to_string(),
        reason,
    })
}

/// Validates derived table and view names and their mutual distinctness.
fn check_table_names(message: &str, naming: &dyn NamingConvention) -> Result<(), SchemaError> {
    let objects = [
        ("sensitive table", naming.sensitive_table(message)),
        ("audit table", naming.audit_table(message)),
        ("view", naming.view(message)),
    ];
    let mut owners: BTreeMap<String, &str> = BTreeMap::new();
    for (kind, name) in &objects {
        check_identifier(message, name)?;
        let folded = name.to_ascii_lowercase();
        if folded.starts_with("sqlite_") {
            return Err(SchemaError::InvalidIdentifier {
                message: message.to_string(),
                name: name.clone(),
                reason: "names starting with sqlite_ are reserved".to_string(),
            });
        }
        if let Some(first) = owners.insert(folded, kind) {
            return Err(SchemaError::TableCollision {
                message: message.to_string(),
                name: name.clone(),
                first: first.to_string(),
                second: (*kind).to_string(),
            });
        }
    }
    Ok(())
}

/// Validates audit row names and view column names for collisions.
///
/// A plaintext audit entry of a field that is already a sensitive column is
/// projected once in the view, so it does not collide with itself. A hashed
/// row name that folds onto any view column, including the field's own
/// sensitive column, is a collision.
fn check_column_names(
    message: &str,
    fields: &[ClassifiedField],
    naming: &dyn NamingConvention,
) -> Result<(), SchemaError> {
    let mut view_columns: BTreeMap<String, &str> = BTreeMap::new();
    for field in fields.iter().filter(|field| field.classification.in_sensitive_table()) {
        view_columns.insert(field.name.to_ascii_lowercase(), field.name.as_str());
    }

    let mut audit_rows: BTreeMap<String, &str> = BTreeMap::new();
    for field in fields {
        let row_name = match field.classification.audit {
            AuditMode::None => continue,
            AuditMode::Plaintext => field.name.clone(),
            AuditMode::Hashed => naming.hashed_field(&field.name),
        };
        check_identifier(message, &row_name)?;
        let folded = row_name.to_ascii_lowercase();
        if let Some(other) = audit_rows.insert(folded.clone(), field.name.as_str()) {
            return Err(collision(message, field, other, &row_name));
        }
        let projected_by_sensitive = field.classification.in_sensitive_table()
            && field.classification.audit == AuditMode::Plaintext;
        if projected_by_sensitive {
            continue;
        }
        if let Some(other) = view_columns.insert(folded, field.name.as_str()) {
            return Err(collision(message, field, other, &row_name));
        }
    }
    Ok(())
}

/// Builds a name collision error.
fn collision(message: &str, field: &ClassifiedField, other: &str, name: &str) -> SchemaError {
    SchemaError::NameCollision {
        message: message.to_string(),
        field: field.name.clone(),
        other: other.to_string(),
        name: name.to_string(),
    }
}
