use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

pub mod queries;
pub mod schema;

pub fn init_database(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;

    // Enable WAL mode
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    // Habit deletion relies on the tracking-row cascade
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // Create schema
    schema::create_tables(&conn)?;

    Ok(conn)
}

/// In-memory database with the full schema, for tests and ephemeral use.
pub fn init_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::create_tables(&conn)?;
    Ok(conn)
}
