// crates/sdm-codegen/src/lib.rs
// ============================================================================
// Module: SDM Codegen Library
// Description: Deterministic generator for SDM repository artifacts.
// Purpose: Turn schema files into SQL DDL and Rust repositories.
// Dependencies: sdm-core, serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! The generator derives each message once (see [`sdm_core::derive`]) and
//! hands the structured result to every selected [`Backend`]. Output is
//! deterministic: files follow request order, messages follow declaration
//! order, and every backend embeds the statements rendered by
//! [`sdm_core::sql`].
//!
//! A message that fails derivation is reported as a [`MessageFailure`] and
//! omitted; its siblings are still generated.
//!
//! ## Index
//! - Orchestration: [`Generator`], [`GenerationOutput`]
//! - Backends: [`BackendKind`], [`Backend`]
//! - Plugin protocol: [`protocol::GenerateRequest`], [`protocol::run_plugin`]
//! - Extra files: [`merge_extra_files`]

pub mod backend;
pub mod error;
pub mod merge;
pub mod orchestrator;
pub mod output;
pub mod protocol;
pub mod rust_backend;
pub mod sql_backend;

pub use backend::Backend;
pub use backend::BackendKind;
pub use error::CodegenError;
pub use merge::merge_extra_files;
pub use orchestrator::Generator;
pub use output::GeneratedFile;
pub use output::GenerationOutput;
pub use output::MessageFailure;
