// circuitgate-store/src/conn.rs
// ============================================================================
// Module: Circuitgate Store Connection
// Description: Shared SQLite connection, schema migration, and time codec.
// Purpose: Give every store implementation in this crate one connection
//          handle and one schema version to check against.
// Dependencies: rusqlite, time
// ============================================================================

//! ## Overview
//! A single `SQLite` connection in WAL mode is shared across the four store
//! implementations via `Arc<Mutex<Connection>>`. Each query holds the mutex
//! only for the statement's own duration; nothing awaits while holding it.

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Schema version this crate's migrations bring a database up to.
pub const SCHEMA_VERSION: i64 = 1;

/// Errors opening or migrating the store's connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnError {
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

/// A shared handle to the store's `SQLite` connection.
#[derive(Clone)]
pub struct SqliteHandle {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteHandle {
    /// Opens (creating if absent) a `SQLite` database at `path`, enables
    /// WAL mode, and applies migrations up to [`SCHEMA_VERSION`].
    ///
    /// # Errors
    ///
    /// Returns [`ConnError`] when the database cannot be opened or
    /// migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConnError> {
        let connection = Connection::open(path)?;
        connection.pragma_update(None, "journal_mode", "WAL")?;
        connection.pragma_update(None, "foreign_keys", "ON")?;
        migrate(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Opens an in-memory database, primarily for tests.
    ///
    /// # Errors
    ///
    /// Returns [`ConnError`] when the database cannot be initialized.
    pub fn open_in_memory() -> Result<Self, ConnError> {
        let connection = Connection::open_in_memory()?;
        connection.pragma_update(None, "foreign_keys", "ON")?;
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

    /// Runs `f` with exclusive, mutable access to the underlying connection.
    /// Needed for call sites that open a [`rusqlite::Transaction`], which
    /// borrows the connection mutably.
    pub fn with_connection_mut<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> rusqlite::Result<T> {
        let mut guard = self
            .connection
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }
}

fn migrate(connection: &Connection) -> Result<(), ConnError> {
    let current_version: i64 = connection
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .optional()?
        .unwrap_or(0);

    if current_version > SCHEMA_VERSION {
        return Err(ConnError::VersionTooNew {
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
        let handle = SqliteHandle::open_in_memory().expect("in-memory database opens");
        let version: i64 = handle
            .with_connection(|conn| conn.query_row("PRAGMA user_version", [], |row| row.get(0)))
            .expect("pragma read succeeds");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn timestamp_round_trips_through_rfc3339() {
        let now = OffsetDateTime::now_utc();
        let encoded = encode_timestamp(now).expect("encodes");
        let decoded = decode_timestamp(&encoded).expect("decodes");
        assert_eq!(now.unix_timestamp(), decoded.unix_timestamp());
    }
}
