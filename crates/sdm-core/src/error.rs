// crates/sdm-core/src/error.rs
// ============================================================================
// Module: SDM Core Errors
// Description: Generation-time error taxonomy.
// Purpose: Report schema problems with message and field context.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`SchemaError`] is fatal for the message it names and never for sibling
//! messages. [`RenderError`] is the hash-computation safety valve raised when
//! a runtime value cannot be rendered canonically.

use thiserror::Error;

use crate::descriptor::ValueType;

// ============================================================================
// SECTION: Schema Errors
// ============================================================================

/// Errors raised while classifying or deriving a message.
///
/// # Invariants
/// - Every variant names the offending message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The message declares no primary key.
    #[error("message {message}: no field is marked primary_key")]
    MissingPrimaryKey {
        /// Message name.
        message: String,
    },
    /// The message declares more than one primary key.
    #[error("message {message}: multiple primary_key fields: {}", .fields.join(", "))]
    DuplicatePrimaryKey {
        /// Message name.
        message: String,
        /// Fields marked as primary key.
        fields: Vec<String>,
    },
    /// Two fields share a name.
    #[error("message {message}: field {field} is declared more than once")]
    DuplicateField {
        /// Message name.
        message: String,
        /// Repeated field name.
        field: String,
    },
    /// Two fields resolve to the same derived column or audit row name.
    #[error("message {message}: derived name {name} of field {field} collides with field {other}")]
    NameCollision {
        /// Message name.
        message: String,
        /// Field whose derived name collides.
        field: String,
        /// Field that already owns the name.
        other: String,
        /// Colliding derived name.
        name: String,
    },
    /// Two derived storage objects resolve to the same name.
    #[error("message {message}: derived {first} and {second} both resolve to {name}")]
    TableCollision {
        /// Message name.
        message: String,
        /// Colliding name.
        name: String,
        /// First storage object kind.
        first: String,
        /// Second storage object kind.
        second: String,
    },
    /// The primary key type cannot be rendered as a stable key string.
    #[error("message {message}: primary key {field} has type {ty}, which is not a stable key type")]
    UnrenderableKey {
        /// Message name.
        message: String,
        /// Primary key field.
        field: String,
        /// Declared type.
        ty: ValueType,
    },
    /// A tracked field has a type that cannot be persisted.
    #[error("message {message}: field {field} of type {ty} cannot be persisted")]
    UnsupportedType {
        /// Message name.
        message: String,
        /// Offending field.
        field: String,
        /// Declared type.
        ty: ValueType,
    },
    /// A message, field, or derived name is not a safe identifier.
    #[error("message {message}: invalid identifier {name}: {reason}")]
    InvalidIdentifier {
        /// Message name.
        message: String,
        /// Offending identifier.
        name: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl SchemaError {
    /// Returns the message the error belongs to.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::MissingPrimaryKey {
                message,
            }
            | Self::DuplicatePrimaryKey {
                message, ..
            }
            | Self::DuplicateField {
                message, ..
            }
            | Self::NameCollision {
                message, ..
            }
            | Self::TableCollision {
                message, ..
            }
            | Self::UnrenderableKey {
                message, ..
            }
            | Self::UnsupportedType {
                message, ..
            }
            | Self::InvalidIdentifier {
                message, ..
            } => message,
        }
    }

    /// Returns the field the error points at, when there is one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::DuplicateField {
                field, ..
            }
            | Self::NameCollision {
                field, ..
            }
            | Self::UnrenderableKey {
                field, ..
            }
            | Self::UnsupportedType {
                field, ..
            } => Some(field),
            Self::InvalidIdentifier {
                name, ..
            } => Some(name),
            Self::MissingPrimaryKey {
                ..
            }
            | Self::DuplicatePrimaryKey {
                ..
            }
            | Self::TableCollision {
                ..
            } => None,
        }
    }
}

// ============================================================================
// SECTION: Value Rendering Errors
// ============================================================================

/// Errors raised when a runtime value cannot be rendered canonically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The value kind does not match the declared field type.
    #[error("field {field}: expected {expected} value, got {actual}")]
    TypeMismatch {
        /// Field name.
        field: String,
        /// Declared type.
        expected: ValueType,
        /// Kind of the supplied value.
        actual: &'static str,
    },
    /// The declared type has no canonical rendering.
    #[error("field {field}: type {ty} has no canonical rendering")]
    Unrenderable {
        /// Field name.
        field: String,
        /// Declared type.
        ty: ValueType,
    },
}

// ============================================================================
// SECTION: Descriptor Errors
// ============================================================================

/// Errors raised while decoding descriptor payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// JSON decoding failed.
    #[error("descriptor parse error: {0}")]
    Parse(String),
    /// Payload exceeded the size limit.
    #[error("descriptor payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}
