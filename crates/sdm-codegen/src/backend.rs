// crates/sdm-codegen/src/backend.rs
// ============================================================================
// Module: SDM Emitter Backends
// Description: Backend selection and the rendering interface.
// Purpose: Render derived schemas into one output file per schema file.
// Dependencies: sdm-core, serde, crate::{rust_backend, sql_backend}
// ============================================================================

//! ## Overview
//! A [`Backend`] renders text from [`DerivedSchemas`]; it never re-derives or
//! re-validates. Every backend writes one file per schema file, named from
//! the schema file stem and the backend suffix, beside the source path.

use std::fmt;
use std::str::FromStr;

use sdm_core::DerivedSchemas;
use sdm_core::SchemaFile;
use serde::Deserialize;
use serde::Serialize;

use crate::error::CodegenError;
use crate::rust_backend::RustBackend;
use crate::sql_backend::SqlBackend;

// ============================================================================
// SECTION: Backend Interface
// ============================================================================

/// Renders derived schemas into one output file.
pub trait Backend: Send + Sync {
    /// Returns the file name suffix appended to the schema file stem.
    fn suffix(&self) -> &'static str;

    /// Returns the comment prefix used for the generated header.
    fn comment(&self) -> &'static str;

    /// Renders the section for one message.
    fn render_message(&self, schemas: &DerivedSchemas) -> String;

    /// Renders the preamble placed after the header.
    fn render_preamble(&self, _file: &SchemaFile) -> String {
        String::new()
    }

    /// Returns the output path for a schema file.
    fn file_name(&self, file: &SchemaFile) -> String {
        format!("{}{}{}", file.dir_prefix(), file.stem(), self.suffix())
    }

    /// Renders the complete file.
    fn render_file(&self, file: &SchemaFile, messages: &[DerivedSchemas]) -> String {
        let comment = self.comment();
        let mut out = format!("{comment} This file is @generated by sdm-codegen. DO NOT EDIT.\n");
        out.push_str(comment);
        out.push_str(" Source: ");
        out.push_str(&file.name);
        out.push('\n');
        out.push_str(&self.render_preamble(file));
        for schemas in messages {
            out.push('\n');
            out.push_str(&self.render_message(schemas));
        }
        out
    }
}

// ============================================================================
// SECTION: Backend Selection
// ============================================================================

/// Built-in backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// SQL DDL, `<stem>.sdm.sql`.
    Sql,
    /// Rust repository over rusqlite, `<stem>_sdm_repo.rs`.
    Rust,
}

/// Shared SQL backend instance.
static SQL_BACKEND: SqlBackend = SqlBackend;
/// Shared Rust backend instance.
static RUST_BACKEND: RustBackend = RustBackend;

impl BackendKind {
    /// Every built-in backend in default order.
    pub const ALL: [Self; 2] = [Self::Sql, Self::Rust];

    /// Returns the stable backend name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Rust => "rust",
        }
    }

    /// Returns the backend implementation.
    #[must_use]
    pub fn backend(self) -> &'static dyn Backend {
        match self {
            Self::Sql => &SQL_BACKEND,
            Self::Rust => &RUST_BACKEND,
        }
    }

    /// Parses a comma-separated backend list; empty input selects all.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::UnknownBackend`] for unrecognized names.
    pub fn parse_list(value: &str) -> Result<Vec<Self>, CodegenError> {
        let mut kinds = Vec::new();
        for name in value.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            let kind = name.parse::<Self>()?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        if kinds.is_empty() {
            kinds.extend(Self::ALL);
        }
        Ok(kinds)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = CodegenError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sql" => Ok(Self::Sql),
            "rust" => Ok(Self::Rust),
            other => Err(CodegenError::UnknownBackend(other.to_string())),
        }
    }
}
