// crates/sdm-cli/src/lib.rs
// ============================================================================
// Module: SDM CLI Library
// Description: Shared helpers for the `sdm` command-line interface.
// Purpose: Keep input loading, output writing, and logging testable.
// Dependencies: sdm-codegen, sdm-config, sdm-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! The binary entry point (`src/main.rs`) parses arguments and dispatches;
//! everything that touches the filesystem or the logger lives here.
//!
//! Security posture: descriptor and extra-file inputs are untrusted. Reads
//! are size-limited and generated paths may not escape the output directory.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod error;
pub mod inputs;
pub mod logging;
pub mod output;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::CliError;
pub use error::CliResult;
