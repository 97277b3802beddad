// crates/sdm-cli/src/inputs.rs
// ============================================================================
// Module: SDM CLI Inputs
// Description: Bounded loading of descriptor and extra-file JSON.
// Purpose: Turn user-supplied paths into validated in-memory inputs.
// Dependencies: sdm-codegen, sdm-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! Every input is read through [`read_bytes_with_limit`], which checks file
//! metadata first and then caps the read itself, so a file that grows while
//! being read still fails closed.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use sdm_codegen::GeneratedFile;
use sdm_core::SchemaFile;
use sdm_core::descriptor::MAX_DESCRIPTOR_BYTES;
use tracing::debug;

use crate::error::CliError;
use crate::error::CliResult;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of one extra-file JSON input.
pub const MAX_EXTRA_FILE_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Reads and parses descriptor files in the given order.
///
/// # Errors
///
/// Returns [`CliError`] on the first unreadable, oversized, or malformed file.
pub fn load_schema_files(paths: &[PathBuf]) -> CliResult<Vec<SchemaFile>> {
    paths
        .iter()
        .map(|path| {
            let bytes = read_bytes_with_limit(path, MAX_DESCRIPTOR_BYTES)?;
            let file = SchemaFile::from_json_slice(&bytes).map_err(|err| CliError::Input {
                path: path.display().to_string(),
                error: err.to_string(),
            })?;
            debug!(path = %path.display(), messages = file.messages.len(), "loaded schema file");
            Ok(file)
        })
        .collect()
}

/// Reads extra-file lists and concatenates them in the given order.
///
/// Each input is a JSON array of `{"name": ..., "content": ...}` objects.
///
/// # Errors
///
/// Returns [`CliError`] on the first unreadable, oversized, or malformed file.
pub fn load_extra_files(paths: &[PathBuf]) -> CliResult<Vec<GeneratedFile>> {
    let mut files = Vec::new();
    for path in paths {
        let bytes = read_bytes_with_limit(path, MAX_EXTRA_FILE_BYTES)?;
        let batch: Vec<GeneratedFile> =
            serde_json::from_slice(&bytes).map_err(|err| CliError::Input {
                path: path.display().to_string(),
                error: err.to_string(),
            })?;
        files.extend(batch);
    }
    Ok(files)
}

/// Reads a file from disk while enforcing a hard size limit.
///
/// # Errors
///
/// Returns [`CliError::Io`] when the file cannot be read and
/// [`CliError::TooLarge`] when it exceeds `max_bytes`.
pub fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> CliResult<Vec<u8>> {
    let too_large = |size: u64| CliError::TooLarge {
        path: path.display().to_string(),
        size,
        limit: max_bytes,
    };
    let file = File::open(path).map_err(|err| CliError::io(path, &err))?;
    let size = file.metadata().map_err(|err| CliError::io(path, &err))?.len();
    let limit = u64::try_from(max_bytes).map_err(|_| too_large(size))?;
    if size > limit {
        return Err(too_large(size));
    }

    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| CliError::io(path, &err))?;
    if bytes.len() > max_bytes {
        return Err(too_large(u64::try_from(bytes.len()).unwrap_or(u64::MAX)));
    }
    Ok(bytes)
}
