// crates/sdm-store-sqlite/src/lib.rs
// ============================================================================
// Module: SDM SQLite Repository Library
// Description: Runtime repository for derived SDM schemas.
// Purpose: Execute atomic saves and view reads against SQLite.
// Dependencies: crate::{connection, error, repository}
// ============================================================================

//! ## Overview
//! [`SqliteRepository`] drives the SQL rendered by [`sdm_core::sql`] for one
//! message: a save upserts the sensitive row and appends every audit row in
//! one transaction, and a fetch reads the reconciling view by primary key.
//! Generated repositories reuse [`RepositoryError`] so both paths report
//! failures the same way.

pub mod connection;
pub mod error;
pub mod repository;

pub use connection::DEFAULT_BUSY_TIMEOUT_MS;
pub use connection::SqliteConnectionConfig;
pub use connection::SqliteJournalMode;
pub use connection::SqliteSyncMode;
pub use connection::open_connection;
pub use connection::open_in_memory;
pub use error::RepositoryError;
pub use repository::AuditRow;
pub use repository::Record;
pub use repository::SqliteRepository;
pub use repository::ViewRecord;
