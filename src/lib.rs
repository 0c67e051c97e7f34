pub mod api;
pub mod auth;
pub mod billing;
pub mod config;
pub mod dashboard;
pub mod database;
pub mod generation;
pub mod inputs;
pub mod normalizer;
pub mod panels;
pub mod questionnaire;
pub mod storage;


use api::{ApiClient, ApiError};
use auth::{AuthManager, CredentialStore};
use billing::BillingService;
use config::ClientConfig;
use dashboard::Dashboard;
use database::DatabaseManager;
use generation::GenerationMonitor;
use inputs::InputsService;
use questionnaire::{FoundationQuestionCache, QuestionnaireRunner, ResumePlan};
use std::sync::Arc;
use std::time::Duration;
use storage::{LocalStorage, SqliteStorage};
use tracing::debug;

/// Every service the client needs, sharing one API client and one store.
pub struct AppContext {
    pub config: ClientConfig,
    pub api: Arc<ApiClient>,
    pub auth: AuthManager,
    pub cache: FoundationQuestionCache,
    pub dashboard: Dashboard,
    pub billing: BillingService,
    pub inputs: InputsService,
    pub monitor: GenerationMonitor,
}

impl AppContext {
    /// Opens the SQLite store under the configured data directory.
    pub fn open(config: ClientConfig) -> Result<Self, ApiError> {
        let db = DatabaseManager::open(&config.data_dir)?;
        debug!("Using data directory {}", config.data_dir.display());
        Self::with_storage(config, Arc::new(SqliteStorage::new(db)))
    }

    /// Wires the services and restores any stored sign-in.
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn LocalStorage>) -> Result<Self, ApiError> {
        let credentials = CredentialStore::new(storage.clone(), config.expiry_buffer_secs);
        let api = Arc::new(ApiClient::new(&config.api_base_url, credentials)?);

        let auth = AuthManager::new(api.clone(), storage.clone());
        auth.restore()?;

        let cache = FoundationQuestionCache::new(storage);
        let dashboard = Dashboard::new(
            api.clone(),
            cache.clone(),
            config.approval_threshold,
            config.min_credits,
        );
        let monitor = GenerationMonitor::new(
            api.clone(),
            Duration::from_secs(config.status_poll_interval_secs),
        );

        Ok(Self {
            billing: BillingService::new(api.clone()),
            inputs: InputsService::new(api.clone()),
            auth,
            cache,
            dashboard,
            monitor,
            api,
            config,
        })
    }

    pub fn runner(&self, plan: ResumePlan) -> QuestionnaireRunner {
        QuestionnaireRunner::from_plan(self.api.clone(), plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStorage, ACCESS_TOKEN_KEY, USER_KEY};

    #[test]
    fn test_restores_stored_user() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.set_item(ACCESS_TOKEN_KEY, "abc").unwrap();
        storage
            .set_item(USER_KEY, r#"{"id":3,"email":"a@b.c","name":"Ann"}"#)
            .unwrap();

        let config = ClientConfig::default().with_base_url("http://localhost:5000/api");
        let app = AppContext::with_storage(config, storage).unwrap();

        assert_eq!(app.auth.current_user().unwrap().id, 3);
        assert_eq!(app.api.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn test_open_creates_store_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::default().with_data_dir(dir.path());

        let app = AppContext::open(config).unwrap();

        assert!(!app.auth.is_authenticated());
        assert!(dir.path().join(database::DATABASE_FILE).exists());
    }
}
