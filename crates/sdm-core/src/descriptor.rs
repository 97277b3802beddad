// crates/sdm-core/src/descriptor.rs
// ============================================================================
// Module: SDM Descriptors
// Description: Already-parsed schema descriptors with governance annotations.
// Purpose: Provide the logical message/field model consumed by the deriver.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Descriptors arrive already parsed by an upstream schema compiler and are
//! exchanged as JSON. A [`SchemaFile`] holds ordered [`MessageDescriptor`]s,
//! each holding ordered [`FieldDescriptor`]s whose [`FieldOptions`] carry the
//! governance annotations. No validation happens here; see
//! [`crate::classify`] for the message-level checks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::error::DescriptorError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum descriptor payload size accepted from untrusted inputs.
pub const MAX_DESCRIPTOR_BYTES: usize = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Value Types
// ============================================================================

/// Logical value type of a field.
///
/// # Invariants
/// - Serialized names are stable and match the descriptor JSON format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// UTF-8 string.
    String,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Unsigned 64-bit integer.
    Uint64,
    /// Boolean.
    Bool,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Raw bytes.
    Bytes,
    /// Enumeration, carried as its integer number.
    Enum,
    /// Nested message. Never persisted by the generator.
    Message,
}

impl ValueType {
    /// Returns true when values of this type form a stable storage key.
    #[must_use]
    pub const fn is_key_capable(self) -> bool {
        matches!(self, Self::String | Self::Int32 | Self::Int64 | Self::Uint32 | Self::Uint64)
    }

    /// Returns true when values of this type can be stored in a derived table.
    #[must_use]
    pub const fn is_storable(self) -> bool {
        !matches!(self, Self::Message)
    }

    /// Returns true for integer-like types.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64 | Self::Uint32 | Self::Uint64 | Self::Enum)
    }

    /// Returns the descriptor name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bytes => "bytes",
            Self::Enum => "enum",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Annotations
// ============================================================================

/// Governance annotations attached to a field.
///
/// `hashed` implies a hashed audit entry whether or not `audited` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldOptions {
    /// Marks the primary key of the message.
    pub primary_key: bool,
    /// Routes the field into the sensitive table.
    pub sensitive: bool,
    /// Records the field in the audit table as plaintext.
    pub audited: bool,
    /// Records the field in the audit table as a digest.
    pub hashed: bool,
}

// ============================================================================
// SECTION: Descriptors
// ============================================================================

/// One field of a logical message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDescriptor {
    /// Field name as declared in the schema.
    pub name: String,
    /// Declared value type.
    #[serde(rename = "type")]
    pub ty: ValueType,
    /// Governance annotations.
    #[serde(default)]
    pub options: FieldOptions,
}

impl FieldDescriptor {
    /// Creates an unannotated field.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            options: FieldOptions::default(),
        }
    }

    /// Marks the field as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.options.primary_key = true;
        self
    }

    /// Marks the field as sensitive.
    #[must_use]
    pub const fn sensitive(mut self) -> Self {
        self.options.sensitive = true;
        self
    }

    /// Marks the field as audited in plaintext.
    #[must_use]
    pub const fn audited(mut self) -> Self {
        self.options.audited = true;
        self
    }

    /// Marks the field as audited by digest.
    #[must_use]
    pub const fn hashed(mut self) -> Self {
        self.options.hashed = true;
        self
    }
}

/// A logical message: a name plus its ordered fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageDescriptor {
    /// Message name, conventionally `PascalCase`.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    /// Creates a message descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// One schema file from the upstream descriptor set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    /// Source-relative file name, e.g. `user/user.proto`.
    pub name: String,
    /// Optional package name.
    #[serde(default)]
    pub package: Option<String>,
    /// Messages in declaration order.
    #[serde(default)]
    pub messages: Vec<MessageDescriptor>,
}

impl SchemaFile {
    /// Parses a schema file from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError`] when the payload is oversized or malformed.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, DescriptorError> {
        if bytes.len() > MAX_DESCRIPTOR_BYTES {
            return Err(DescriptorError::TooLarge {
                max_bytes: MAX_DESCRIPTOR_BYTES,
                actual_bytes: bytes.len(),
            });
        }
        serde_json::from_slice(bytes).map_err(|err| DescriptorError::Parse(err.to_string()))
    }

    /// Returns the file name without its directory and extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        let base = self.name.rsplit('/').next().unwrap_or(&self.name);
        base.split_once('.').map_or(base, |(stem, _)| stem)
    }

    /// Returns the directory prefix of the file name, including the trailing slash.
    #[must_use]
    pub fn dir_prefix(&self) -> &str {
        self.name.rfind('/').map_or("", |idx| &self.name[..= idx])
    }
}
