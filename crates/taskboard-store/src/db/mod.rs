//! SQLite connection setup.
//!
//! Runtime defaults:
//! - `journal_mode = WAL` so a reader never blocks the single writer
//! - `busy_timeout = 5s` to ride out a second process holding the lock
//! - `synchronous = NORMAL`, durable enough under WAL
//!
//! Parent/child links are plain indexed columns without `FOREIGN KEY`
//! constraints; cascades are explicit statements inside one transaction
//! and the cleanup pass repairs anything left dangling.

pub mod migrations;
pub mod rows;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the database file, apply pragmas and migrate the
/// schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening, configuring or migrating the database fails.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create database directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply schema migrations")?;

    Ok(conn)
}

/// A migrated private in-memory database.
///
/// # Errors
///
/// Returns an error if SQLite cannot allocate the database or migrate it.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory database")?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)
        .context("configure sqlite busy timeout")?;
    migrations::migrate(&mut conn).context("apply schema migrations")?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}
