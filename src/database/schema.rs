use rusqlite::{Connection, Result};

pub fn initialize(conn: &Connection) -> Result<()> {
    // Key/value items that survive restarts (tokens, user, question caches)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS local_storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_local_storage_updated ON local_storage(updated_at)",
        [],
    )?;

    Ok(())
}
