// crates/sdm-config/src/lib.rs
// ============================================================================
// Module: SDM Config Library
// Description: Canonical `sdm.toml` model, loading, and template rendering.
// Purpose: Single source of truth for generator configuration semantics.
// Dependencies: sdm-codegen, sdm-core, serde, toml
// ============================================================================

//! ## Overview
//! `sdm-config` defines the configuration consumed by the `sdm` CLI: which
//! descriptor files to read, where to write output, which backends to run,
//! and how derived tables, views, and hashed fields are named. Loading is
//! strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod template;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use template::config_template;
