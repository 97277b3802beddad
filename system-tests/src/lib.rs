// system-tests/src/lib.rs
// ============================================================================
// Module: SDM System Tests Library
// Description: Generated repository code for the ledger fixture.
// Purpose: Hold generator output to the same compiler and lints as hand code.
// Dependencies: rusqlite, sdm-core, sdm-store-sqlite
// ============================================================================

//! ## Overview
//! [`ledger`] is the Rust backend's output for `fixtures/ledger.json`,
//! rendered by the build script. The fixture covers every storable value
//! type, a keyword field name, `uint64` keys and columns, a string key with a
//! hashed field, and a key-only message. The tests in `system-tests/tests`
//! drive the generated repositories against `SQLite`.

/// Repositories generated from `fixtures/ledger.json`.
#[allow(
    clippy::pedantic,
    clippy::nursery,
    reason = "Generated code is held to compilation and behavior, not style lints."
)]
pub mod ledger {
    include!(concat!(env!("OUT_DIR"), "/ledger_sdm_repo.rs"));
}
