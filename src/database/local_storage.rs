use rusqlite::{params, Connection, OptionalExtension, Result};

/// Read one item, `None` when the key was never written or was removed
pub fn get_item(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM local_storage WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .optional()
}

/// Insert or replace an item
pub fn set_item(conn: &Connection, key: &str, value: &str, updated_at: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO local_storage (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, updated_at],
    )?;
    Ok(())
}

/// Delete an item; deleting a missing key is not an error
pub fn remove_item(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM local_storage WHERE key = ?1", [key])?;
    Ok(())
}
