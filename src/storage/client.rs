use super::types::StorageError;
use crate::database::{local_storage, DatabaseManager};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

/// Synchronous string key/value store that outlives the process.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Default)]
pub struct InMemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for InMemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.read().map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned)?;
        items.remove(key);
        Ok(())
    }
}

pub struct SqliteStorage {
    db: DatabaseManager,
}

impl SqliteStorage {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }
}

impl LocalStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.db.with_connection(|conn| local_storage::get_item(conn, key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let updated_at = Utc::now().to_rfc3339();
        self.db
            .with_connection(|conn| local_storage::set_item(conn, key, value, &updated_at))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.db.with_connection(|conn| local_storage::remove_item(conn, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(storage: &dyn LocalStorage) {
        assert!(storage.get_item("access_token").unwrap().is_none());

        storage.set_item("access_token", "abc").unwrap();
        storage.set_item("df_foundation_questions_7", "[]").unwrap();
        assert_eq!(storage.get_item("access_token").unwrap().as_deref(), Some("abc"));
        assert_eq!(
            storage.get_item("df_foundation_questions_7").unwrap().as_deref(),
            Some("[]")
        );

        storage.remove_item("access_token").unwrap();
        assert!(storage.get_item("access_token").unwrap().is_none());
    }

    #[test]
    fn test_in_memory_storage() {
        exercise(&InMemoryStorage::new());
    }

    #[test]
    fn test_sqlite_storage() {
        let db = DatabaseManager::in_memory().unwrap();
        exercise(&SqliteStorage::new(db));
    }
}
