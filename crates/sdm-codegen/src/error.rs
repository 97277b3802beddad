// crates/sdm-codegen/src/error.rs
// ============================================================================
// Module: SDM Codegen Errors
// Description: Error taxonomy for generation and the plugin protocol.
// Purpose: Report invocation-level failures with stable variants.
// Dependencies: sdm-core, thiserror
// ============================================================================

//! ## Overview
//! Per-message schema problems are collected as
//! [`crate::MessageFailure`]s; [`CodegenError`] covers failures of a whole
//! invocation.

use sdm_core::naming::NamingError;
use thiserror::Error;

use crate::output::MessageFailure;

/// Errors raised by the generator.
///
/// # Invariants
/// - Variant meanings are stable for automation and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// One or more messages failed derivation.
    #[error("{} message(s) failed: {}", .0.len(), summarize(.0))]
    Messages(Vec<MessageFailure>),
    /// A requested file is not among the supplied schema files.
    #[error("file to generate not found: {0}")]
    MissingFile(String),
    /// Two generated or extra files share an output path.
    #[error("duplicate output file: {0}")]
    DuplicateFile(String),
    /// Unknown backend name.
    #[error("unknown backend: {0}")]
    UnknownBackend(String),
    /// Invalid naming template.
    #[error("naming error: {0}")]
    Naming(#[from] NamingError),
    /// JSON serialization or parsing error.
    #[error("json error: {0}")]
    Json(String),
    /// IO error while reading or writing the protocol streams.
    #[error("io error: {0}")]
    Io(String),
    /// Protocol payload exceeded the size limit.
    #[error("request too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

/// Joins failures into one line.
fn summarize(failures: &[MessageFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
