// crates/sdm-store-sqlite/src/connection.rs
// ============================================================================
// Module: SDM SQLite Connections
// Description: Connection opening with durability pragmas.
// Purpose: Hand repositories a configured storage handle.
// Dependencies: rusqlite
// ============================================================================

//! ## Overview
//! Repositories never open connections themselves; callers pass one in. These
//! helpers apply the journal, sync, and busy-timeout settings that make
//! concurrent saves wait instead of failing immediately.

use std::path::PathBuf;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;

use crate::error::RepositoryError;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Default busy timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// `SQLite` journal mode.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqliteJournalMode {
    /// Write-ahead logging.
    #[default]
    Wal,
    /// Rollback journal.
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
        }
    }
}

/// `SQLite` synchronous mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqliteSyncMode {
    /// Sync on every commit.
    #[default]
    Full,
    /// Sync at checkpoints.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Normal => "NORMAL",
        }
    }
}

/// Settings for an on-disk connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConnectionConfig {
    /// Database file path.
    pub path: PathBuf,
    /// Journal mode.
    pub journal_mode: SqliteJournalMode,
    /// Synchronous mode.
    pub sync_mode: SqliteSyncMode,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
}

impl SqliteConnectionConfig {
    /// Returns defaults for the database at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

// ============================================================================
// SECTION: Open
// ============================================================================

/// Opens (creating if needed) an on-disk database and applies pragmas.
///
/// # Errors
///
/// Returns [`RepositoryError::Db`] when the database cannot be opened or
/// configured.
pub fn open_connection(config: &SqliteConnectionConfig) -> Result<Connection, RepositoryError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| RepositoryError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| RepositoryError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| RepositoryError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| RepositoryError::Db(err.to_string()))?;
    Ok(connection)
}

/// Opens an in-memory database.
///
/// # Errors
///
/// Returns [`RepositoryError::Db`] when `SQLite` cannot allocate the database.
pub fn open_in_memory() -> Result<Connection, RepositoryError> {
    Connection::open_in_memory().map_err(|err| RepositoryError::Db(err.to_string()))
}
