// crates/sdm-codegen/src/merge.rs
// ============================================================================
// Module: SDM Extra-File Merge
// Description: Appends externally produced files to generated output.
// Purpose: Pass foreign artifacts through unchanged, rejecting path clashes.
// Dependencies: crate::{error, output}
// ============================================================================

//! ## Overview
//! Extra files come from other tools and are emitted byte for byte after the
//! generator's own files. Paths must be unique across both sets.

use std::collections::BTreeSet;

use crate::error::CodegenError;
use crate::output::GeneratedFile;

/// Appends `extra` after `own`, unchanged and in order.
///
/// # Errors
///
/// Returns [`CodegenError::DuplicateFile`] when any two files share a path.
pub fn merge_extra_files(
    own: Vec<GeneratedFile>,
    extra: Vec<GeneratedFile>,
) -> Result<Vec<GeneratedFile>, CodegenError> {
    let mut seen = BTreeSet::new();
    let mut merged = Vec::with_capacity(own.len() + extra.len());
    for file in own.into_iter().chain(extra) {
        if !seen.insert(file.name.clone()) {
            return Err(CodegenError::DuplicateFile(file.name));
        }
        merged.push(file);
    }
    Ok(merged)
}
