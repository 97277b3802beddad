// crates/sdm-codegen/src/protocol.rs
// ============================================================================
// Module: SDM Plugin Protocol
// Description: JSON request/response protocol over stdin and stdout.
// Purpose: Let a schema compiler front end drive generation as a plugin.
// Dependencies: sdm-core, serde, serde_json, crate::{backend, error, merge}
// ============================================================================

//! ## Overview
//! The host writes one [`GenerateRequest`] to the plugin's stdin and reads one
//! [`GenerateResponse`] from stdout. Any failure (a broken message, a missing
//! file, an extra-file clash) is reported in `error` with no files, and the
//! host treats the invocation as failed.
//!
//! `parameter` is a comma-separated backend list (`sql,rust`); empty selects
//! the generator's configured backends.
//!
//! ### Security Posture
//! Requests are untrusted input. Reads are bounded by [`MAX_REQUEST_BYTES`]
//! and fail closed on malformed JSON.

use std::io::Read;
use std::io::Write;

use sdm_core::SchemaFile;
use serde::Deserialize;
use serde::Serialize;

use crate::backend::BackendKind;
use crate::error::CodegenError;
use crate::merge::merge_extra_files;
use crate::orchestrator::Generator;
use crate::output::GeneratedFile;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum request size accepted on stdin.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Generation request from the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateRequest {
    /// Schema files to generate output for.
    #[serde(default)]
    pub files_to_generate: Vec<String>,
    /// Every schema file, including dependencies.
    #[serde(default)]
    pub schema_files: Vec<SchemaFile>,
    /// Plugin parameter string.
    #[serde(default)]
    pub parameter: Option<String>,
    /// Files produced elsewhere, appended unchanged.
    #[serde(default)]
    pub extra_files: Vec<GeneratedFile>,
}

/// Generation response to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated files followed by extra files.
    #[serde(default)]
    pub files: Vec<GeneratedFile>,
    /// Failure description; the invocation failed when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResponse {
    /// Builds a failed response.
    #[must_use]
    pub fn failure(error: &CodegenError) -> Self {
        Self {
            files: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Handling
// ============================================================================

/// Generates the response for one request.
#[must_use]
pub fn handle_request(generator: &Generator, request: GenerateRequest) -> GenerateResponse {
    match try_handle_request(generator, request) {
        Ok(files) => GenerateResponse {
            files,
            error: None,
        },
        Err(err) => GenerateResponse::failure(&err),
    }
}

/// Generates, checks for failures, and merges extra files.
fn try_handle_request(
    generator: &Generator,
    request: GenerateRequest,
) -> Result<Vec<GeneratedFile>, CodegenError> {
    let generator = match request.parameter.as_deref().map(str::trim) {
        Some(parameter) if !parameter.is_empty() => {
            generator.clone().with_backends(BackendKind::parse_list(parameter)?)
        }
        _ => generator.clone(),
    };
    let own =
        generator.generate(&request.files_to_generate, &request.schema_files)?.into_result()?;
    merge_extra_files(own, request.extra_files)
}

/// Reads a request from `reader`, writes the response to `writer`.
///
/// Returns the response so callers can map `error` to an exit status.
///
/// # Errors
///
/// Returns [`CodegenError`] only when the streams fail or the response cannot
/// be serialized. Malformed or oversized requests produce an error response.
pub fn run_plugin(
    generator: &Generator,
    reader: impl Read,
    mut writer: impl Write,
) -> Result<GenerateResponse, CodegenError> {
    let response = match read_request(reader) {
        Ok(request) => handle_request(generator, request),
        Err(err @ CodegenError::Io(_)) => return Err(err),
        Err(err) => GenerateResponse::failure(&err),
    };
    serde_json::to_writer(&mut writer, &response)
        .map_err(|err| CodegenError::Json(err.to_string()))?;
    writer.write_all(b"\n").map_err(|err| CodegenError::Io(err.to_string()))?;
    writer.flush().map_err(|err| CodegenError::Io(err.to_string()))?;
    Ok(response)
}

/// Reads and parses a request with a size limit.
fn read_request(reader: impl Read) -> Result<GenerateRequest, CodegenError> {
    let mut bytes = Vec::new();
    let limit = u64::try_from(MAX_REQUEST_BYTES).unwrap_or(u64::MAX).saturating_add(1);
    reader.take(limit).read_to_end(&mut bytes).map_err(|err| CodegenError::Io(err.to_string()))?;
    if bytes.len() > MAX_REQUEST_BYTES {
        return Err(CodegenError::TooLarge {
            max_bytes: MAX_REQUEST_BYTES,
            actual_bytes: bytes.len(),
        });
    }
    serde_json::from_slice(&bytes).map_err(|err| CodegenError::Json(err.to_string()))
}
