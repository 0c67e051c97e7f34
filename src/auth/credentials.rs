use crate::storage::{LocalStorage, StorageError, ACCESS_TOKEN_KEY, TOKEN_EXPIRATION_KEY};
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, RwLock};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Access token and expiry held in memory and written through to local storage.
///
/// Cloning shares the same in-memory state, so the API client and the auth
/// manager always observe the same token.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn LocalStorage>,
    state: Arc<RwLock<Credentials>>,
    expiry_buffer: Duration,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn LocalStorage>, expiry_buffer_secs: i64) -> Self {
        Self {
            storage,
            state: Arc::new(RwLock::new(Credentials::default())),
            expiry_buffer: Duration::seconds(expiry_buffer_secs),
        }
    }

    /// Restore token and expiry from storage into memory.
    pub fn load(&self) -> Result<(), StorageError> {
        let access_token = self.storage.get_item(ACCESS_TOKEN_KEY)?;
        let expires_at = self
            .storage
            .get_item(TOKEN_EXPIRATION_KEY)?
            .and_then(|raw| match DateTime::parse_from_rfc3339(&raw) {
                Ok(dt) => Some(dt.with_timezone(&Utc)),
                Err(e) => {
                    warn!("Ignoring unreadable token expiration {:?}: {}", raw, e);
                    None
                }
            });

        let mut state = self.state.write().map_err(|_| StorageError::Poisoned)?;
        *state = Credentials {
            access_token,
            expires_at,
        };
        Ok(())
    }

    /// Replace the token. A token without an expiry never counts as expired.
    pub fn set(&self, token: &str, expires_at: Option<DateTime<Utc>>) -> Result<(), StorageError> {
        {
            let mut state = self.state.write().map_err(|_| StorageError::Poisoned)?;
            state.access_token = Some(token.to_string());
            state.expires_at = expires_at;
        }

        self.storage.set_item(ACCESS_TOKEN_KEY, token)?;
        match expires_at {
            Some(at) => self.storage.set_item(TOKEN_EXPIRATION_KEY, &at.to_rfc3339())?,
            None => self.storage.remove_item(TOKEN_EXPIRATION_KEY)?,
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        {
            let mut state = self.state.write().map_err(|_| StorageError::Poisoned)?;
            *state = Credentials::default();
        }
        self.storage.remove_item(ACCESS_TOKEN_KEY)?;
        self.storage.remove_item(TOKEN_EXPIRATION_KEY)?;
        Ok(())
    }

    pub fn snapshot(&self) -> Credentials {
        self.state
            .read()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    pub fn access_token(&self) -> Option<String> {
        self.snapshot().access_token
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.snapshot().expires_at {
            Some(expires_at) => now >= expires_at - self.expiry_buffer,
            None => false,
        }
    }
}
