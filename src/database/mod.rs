use crate::storage::StorageError;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub mod local_storage;
pub mod schema;

pub const DATABASE_FILE: &str = "domforge.db";

#[derive(Clone)]
pub struct DatabaseManager {
    conn: Arc<Mutex<Connection>>,
}

impl DatabaseManager {
    /// Opens (or creates) the database inside `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(data_dir)?;
        let conn = Connection::open(data_dir.join(DATABASE_FILE))?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, R>(&self, f: F) -> Result<R, StorageError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<R>,
    {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(f(&conn)?)
    }
}
