// crates/sdm-store-sqlite/src/error.rs
// ============================================================================
// Module: SDM Repository Errors
// Description: Runtime error taxonomy for saves and fetches.
// Purpose: Keep transaction, lookup, and rendering failures distinguishable.
// Dependencies: sdm-core, thiserror
// ============================================================================

//! ## Overview
//! Errors are surfaced verbatim and never retried. A failed save has already
//! been rolled back when [`RepositoryError::Transaction`] is returned.

use sdm_core::RenderError;
use thiserror::Error;

/// Errors raised by SDM repositories.
///
/// # Invariants
/// - Messages carry table and key context, never sensitive field values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Connection setup or migration failed.
    #[error("sqlite repository db error: {0}")]
    Db(String),
    /// A save failed and was rolled back.
    #[error("sqlite repository transaction failed: {0}")]
    Transaction(String),
    /// No sensitive row exists for the key.
    #[error("no row in {table} for key {key}")]
    NotFound {
        /// Table or view that was read.
        table: String,
        /// Rendered primary key.
        key: String,
    },
    /// A value could not be rendered for its audit row or digest.
    #[error("hash computation failed: {0}")]
    Hash(#[from] RenderError),
    /// The record does not carry a value the schema requires.
    #[error("invalid record: {0}")]
    Record(String),
    /// A read failed in storage.
    #[error("sqlite repository read error: {0}")]
    Read(String),
}
