// crates/sdm-core/src/value.rs
// ============================================================================
// Module: SDM Field Values
// Description: Runtime field values and their canonical string rendering.
// Purpose: Give audit rows and digests one stable input representation.
// Dependencies: crate::{descriptor, error, hashing}
// ============================================================================

//! ## Overview
//! Audit rows store field values as text and hashed entries digest that same
//! text, so the rendering must be identical everywhere a value is written or
//! verified. [`Canonical`] is the rendering used by generated repositories;
//! [`FieldValue`] is the dynamic equivalent used by the runtime repository.
//!
//! Rendering rules: strings as-is, integers in decimal, booleans as
//! `true`/`false`, floats as the shortest round-trip decimal, bytes as
//! lowercase hex, enums as their integer number.

use std::fmt;

use crate::descriptor::ValueType;
use crate::error::RenderError;
use crate::hashing::hex_encode;

// ============================================================================
// SECTION: Canonical Rendering
// ============================================================================

/// Canonical string rendering for statically typed field values.
pub trait Canonical {
    /// Returns the canonical string rendering of the value.
    fn canonical(&self) -> String;
}

impl Canonical for str {
    fn canonical(&self) -> String {
        self.to_string()
    }
}

impl Canonical for String {
    fn canonical(&self) -> String {
        self.clone()
    }
}

impl Canonical for [u8] {
    fn canonical(&self) -> String {
        hex_encode(self)
    }
}

impl Canonical for Vec<u8> {
    fn canonical(&self) -> String {
        hex_encode(self)
    }
}

/// Implements [`Canonical`] through `Display` for numeric and boolean types.
macro_rules! canonical_via_display {
    ($($ty:ty),*) => {
        $(
            impl Canonical for $ty {
                fn canonical(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

canonical_via_display!(bool, i32, i64, u32, u64, f32, f64);

// ============================================================================
// SECTION: Dynamic Values
// ============================================================================

/// Dynamically typed runtime value of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// String value.
    Text(String),
    /// Signed 32-bit integer (also used for enums).
    I32(i32),
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// Boolean.
    Bool(bool),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Returns a short name of the value kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "string",
            Self::I32(_) => "int32",
            Self::I64(_) => "int64",
            Self::U32(_) => "uint32",
            Self::U64(_) => "uint64",
            Self::Bool(_) => "bool",
            Self::F32(_) => "float",
            Self::F64(_) => "double",
            Self::Bytes(_) => "bytes",
        }
    }

    /// Returns true when the value may be stored in a field of `ty`.
    #[must_use]
    pub const fn matches(&self, ty: ValueType) -> bool {
        matches!(
            (self, ty),
            (Self::Text(_), ValueType::String)
                | (Self::I32(_), ValueType::Int32 | ValueType::Enum)
                | (Self::I64(_), ValueType::Int64)
                | (Self::U32(_), ValueType::Uint32)
                | (Self::U64(_), ValueType::Uint64)
                | (Self::Bool(_), ValueType::Bool)
                | (Self::F32(_), ValueType::Float)
                | (Self::F64(_), ValueType::Double)
                | (Self::Bytes(_), ValueType::Bytes)
        )
    }
}

impl Canonical for FieldValue {
    fn canonical(&self) -> String {
        match self {
            Self::Text(value) => value.canonical(),
            Self::I32(value) => value.canonical(),
            Self::I64(value) => value.canonical(),
            Self::U32(value) => value.canonical(),
            Self::U64(value) => value.canonical(),
            Self::Bool(value) => value.canonical(),
            Self::F32(value) => value.canonical(),
            Self::F64(value) => value.canonical(),
            Self::Bytes(value) => value.canonical(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Renders `value` canonically after checking it against the declared type.
///
/// # Errors
///
/// Returns [`RenderError`] when the value kind does not match `ty`, or when
/// `ty` has no canonical rendering.
pub fn render_value(field: &str, ty: ValueType, value: &FieldValue) -> Result<String, RenderError> {
    if !ty.is_storable() {
        return Err(RenderError::Unrenderable {
            field: field.to_string(),
            ty,
        });
    }
    if !value.matches(ty) {
        return Err(RenderError::TypeMismatch {
            field: field.to_string(),
            expected: ty,
            actual: value.kind(),
        });
    }
    Ok(value.canonical())
}

// ============================================================================
// SECTION: Conversions
// ============================================================================

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Implements `From<$ty>` for the matching [`FieldValue`] variant.
macro_rules! field_value_from {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

field_value_from!(i32 => I32, i64 => I64, u32 => U32, u64 => U64, bool => Bool, f32 => F32, f64 => F64);
