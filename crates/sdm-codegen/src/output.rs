// crates/sdm-codegen/src/output.rs
// ============================================================================
// Module: SDM Generation Output
// Description: Generated files and per-message failures.
// Purpose: Carry partial results without losing error context.
// Dependencies: sdm-core, serde
// ============================================================================

//! ## Overview
//! [`GenerationOutput`] holds the files rendered for a request alongside the
//! messages that failed derivation. Callers that need all-or-nothing
//! behavior use [`GenerationOutput::into_result`].

use std::fmt;

use sdm_core::SchemaError;
use serde::Deserialize;
use serde::Serialize;

use crate::error::CodegenError;

/// One generated (or pass-through) output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedFile {
    /// Output-relative path.
    pub name: String,
    /// File contents.
    pub content: String,
}

impl GeneratedFile {
    /// Creates a file.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A message that failed derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFailure {
    /// Schema file containing the message.
    pub file: String,
    /// Failure with message and field context.
    pub error: SchemaError,
}

impl fmt::Display for MessageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.error)
    }
}

/// Result of one generation run.
///
/// # Invariants
/// - `files` never contains output for a message listed in `failures`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOutput {
    /// Generated files in request order, backends in selection order.
    pub files: Vec<GeneratedFile>,
    /// Messages that failed derivation.
    pub failures: Vec<MessageFailure>,
}

impl GenerationOutput {
    /// Returns true when every message was generated.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the files, or all failures when any message failed.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::Messages`] when any message failed.
    pub fn into_result(self) -> Result<Vec<GeneratedFile>, CodegenError> {
        if self.failures.is_empty() {
            Ok(self.files)
        } else {
            Err(CodegenError::Messages(self.failures))
        }
    }
}
