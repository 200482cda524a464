// circuitgate-broker/src/conn.rs
// ============================================================================
// Module: Circuitgate Broker Connection
// Description: Shared SQLite connection and schema migration for the job queue.
// Purpose: Give the broker its own small schema, independent of the domain
//          store's connection, so the queue can be backed by a different
//          database file in deployments that want that separation.
// Dependencies: rusqlite, time
// ============================================================================

//! ## Overview
//! Mirrors `circuitgate-store`'s connection/migration idiom at a smaller
//! scale: one table (`jobs`), one migration, `PRAGMA user_version` gated.

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Schema version this crate's migration brings a database up to.
pub const SCHEMA_VERSION: i64 = 1;

/// Errors opening or migrating the broker's connection.
#[derive(Debug, thiserror::Error)]
pub enum BrokerConnError {
    /// The underlying `SQLite` engine reported an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The database's schema version is newer than this build supports.
    #[error("database schema version {found} is newer than supported version {supported}")]
    VersionTooNew {
        /// Version found in the database.
        found: i64,
        /// Version this build supports.
        supported: i64,
    },
}

/// A shared handle to the broker's `SQLite` connection.
#[derive(Clone)]
pub struct BrokerHandle {
    connection: Arc<Mutex<Connection>>,
}

impl BrokerHandle {
    /// Opens (creating if absent) a `SQLite` database at `path` and applies
    /// migrations up to [`SCHEMA_VERSION`].
    ///
    /// # Errors
    ///
    /// Returns [`BrokerConnError`] when the database cannot be opened or
    /// migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BrokerConnError> {
        let connection = Connection::open(path)?;
        connection.pragma_update(None, "journal_mode", "WAL")?;
        migrate(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Opens an in-memory database, primarily for tests.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerConnError`] when the database cannot be initialized.
    pub fn open_in_memory() -> Result<Self, BrokerConnError> {
        let connection = Connection::open_in_memory()?;
        migrate(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Runs `f` with exclusive access to the underlying connection.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> rusqlite::Result<T> {
        let guard = self
            .connection
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&guard)
    }
}

fn migrate(connection: &Connection) -> Result<(), BrokerConnError> {
    let current_version: i64 = connection
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .optional()?
        .unwrap_or(0);

    if current_version > SCHEMA_VERSION {
        return Err(BrokerConnError::VersionTooNew {
            found: current_version,
            supported: SCHEMA_VERSION,
        });
    }

    if current_version < 1 {
        connection.execute_batch(include_str!("migrations/0001_init.sql"))?;
    }

    connection.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

/// Encodes a timestamp as RFC 3339 text for storage.
///
/// # Errors
///
/// Returns a formatting error if `timestamp` cannot be rendered.
pub fn encode_timestamp(timestamp: OffsetDateTime) -> Result<String, time::error::Format> {
    timestamp.format(&Rfc3339)
}

/// Decodes an RFC 3339 timestamp previously written by [`encode_timestamp`].
///
/// # Errors
///
/// Returns a parsing error if `text` is not valid RFC 3339.
pub fn decode_timestamp(text: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(text, &Rfc3339)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_database_opens_and_migrates() {
        let handle = BrokerHandle::open_in_memory().expect("in-memory database opens");
        let version: i64 = handle
            .with_connection(|conn| conn.query_row("PRAGMA user_version", [], |row| row.get(0)))
            .expect("pragma read succeeds");
        assert_eq!(version, SCHEMA_VERSION);
    }
}
