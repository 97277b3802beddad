// crates/sdm-cli/src/logging.rs
// ============================================================================
// Module: SDM CLI Logging
// Description: Tracing subscriber setup for the `sdm` binary.
// Purpose: Route structured logs to stderr so stdout stays protocol-clean.
// Dependencies: tracing-subscriber
// ============================================================================

//! ## Overview
//! The filter comes from `SDM_LOG`, then `RUST_LOG`, then
//! [`DEFAULT_LOG_FILTER`]. `--verbose` raises the `sdm` crates to `debug`.

use std::env;

use tracing_subscriber::EnvFilter;

use crate::error::CliError;

/// Environment variable holding the preferred log filter.
pub const LOG_ENV_VAR: &str = "SDM_LOG";
/// Filter used when no environment override is set.
pub const DEFAULT_LOG_FILTER: &str =
    "warn,sdm_core=info,sdm_codegen=info,sdm_store_sqlite=info,sdm_config=info,sdm_cli=info";
/// Filter used for `--verbose`.
const VERBOSE_LOG_FILTER: &str =
    "info,sdm_core=debug,sdm_codegen=debug,sdm_store_sqlite=debug,sdm_config=debug,sdm_cli=debug";

/// Selects the filter directives from explicit values.
#[must_use]
pub fn select_filter(sdm_log: Option<&str>, rust_log: Option<&str>, verbose: bool) -> String {
    let from_env = [sdm_log, rust_log]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty());
    match from_env {
        Some(value) => value.to_string(),
        None if verbose => VERBOSE_LOG_FILTER.to_string(),
        None => DEFAULT_LOG_FILTER.to_string(),
    }
}

/// Installs the global stderr subscriber.
///
/// # Errors
///
/// Returns [`CliError::Logging`] when the filter is invalid or a subscriber
/// is already installed.
pub fn init_logging(verbose: bool) -> Result<(), CliError> {
    let sdm_log = env::var(LOG_ENV_VAR).ok();
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = select_filter(sdm_log.as_deref(), rust_log.as_deref(), verbose);
    let filter =
        EnvFilter::try_new(&directives).map_err(|err| CliError::Logging(err.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| CliError::Logging(err.to_string()))
}
