// crates/sdm-cli/src/error.rs
// ============================================================================
// Module: SDM CLI Errors
// Description: Error type surfaced by `sdm` subcommands.
// Purpose: Carry one printable message per failure to the entry point.
// Dependencies: sdm-codegen, sdm-config, thiserror
// ============================================================================

//! ## Overview
//! Library errors convert into [`CliError`] through `From`, so subcommands
//! propagate them with `?` and the entry point prints one line.

use sdm_codegen::CodegenError;
use sdm_config::ConfigError;
use thiserror::Error;

/// CLI failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Generation failed.
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    /// A descriptor or extra-file input was malformed.
    #[error("invalid input {path}: {error}")]
    Input {
        /// Offending file.
        path: String,
        /// Parse failure.
        error: String,
    },
    /// An input file exceeded its size limit.
    #[error("input {path} is {size} bytes (limit {limit})")]
    TooLarge {
        /// Offending file.
        path: String,
        /// Observed size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
    /// Filesystem failure.
    #[error("io error on {path}: {error}")]
    Io {
        /// Path being read or written.
        path: String,
        /// Underlying error.
        error: String,
    },
    /// A generated file name would escape the output directory.
    #[error("refusing to write outside the output directory: {0}")]
    UnsafePath(String),
    /// Files on disk differ from freshly generated output.
    #[error("generated output is out of date ({}); run `sdm generate`", .0.join(", "))]
    Drift(Vec<String>),
    /// No descriptor files were given.
    #[error("no schema files: pass --schema or set schema_files in sdm.toml")]
    NoSchemas,
    /// The target file already exists.
    #[error("{0} already exists; pass --force to overwrite")]
    Exists(String),
    /// The logger could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl CliError {
    /// Builds an IO error for `path`.
    #[must_use]
    pub fn io(path: &std::path::Path, error: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}

/// CLI result alias for fallible operations.
pub type CliResult<T> = Result<T, CliError>;
