//! Connection setup for the saved-blueprint database.
//!
//! The database holds two tables: `assets`, one JSON document per package
//! keyed by package name, and `save_log`, the recent write history that
//! [`crate::sqlite::SqliteStore`] prunes. Every connection handed to the
//! store has foreign keys on and the schema brought up to date.

use rusqlite::Connection;
use rusqlite_migration::{Migrations, M};

use crate::error::BackendError;

/// Schema steps, oldest first. Compiled into the binary.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(include_str!("migrations/001_initial_schema.sql"))])
}

/// Opens the blueprint database file at `path`, creating it on first use.
pub fn open_database(path: &str) -> Result<Connection, BackendError> {
    let mut conn = Connection::open(path)?;
    prepare_connection(&mut conn)?;
    Ok(conn)
}

/// A throwaway database for tests and unsaved sessions.
pub fn open_in_memory() -> Result<Connection, BackendError> {
    let mut conn = Connection::open_in_memory()?;
    prepare_connection(&mut conn)?;
    Ok(conn)
}

fn prepare_connection(conn: &mut Connection) -> Result<(), BackendError> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    // save_log rows cascade away with their asset row.
    conn.pragma_update(None, "foreign_keys", "ON")?;

    migrations()
        .to_latest(conn)
        .map_err(|e| BackendError::Migration(e.to_string()))?;

    Ok(())
}
