use super::credentials::CredentialStore;
use super::types::{AuthCallback, User, DEFAULT_USER_EMAIL, DEFAULT_USER_NAME};
use crate::api::{ApiClient, ApiError};
use crate::storage::{LocalStorage, USER_KEY};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Signed-in user and token lifecycle.
pub struct AuthManager {
    api: Arc<ApiClient>,
    storage: Arc<dyn LocalStorage>,
    user: RwLock<Option<User>>,
}

impl AuthManager {
    pub fn new(api: Arc<ApiClient>, storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            api,
            storage,
            user: RwLock::new(None),
        }
    }

    fn credentials(&self) -> &CredentialStore {
        self.api.credentials()
    }

    fn set_user(&self, user: Option<User>) {
        if let Ok(mut current) = self.user.write() {
            *current = user;
        }
    }

    /// Load tokens and, only while a token exists, the stored user.
    pub fn restore(&self) -> Result<Option<User>, ApiError> {
        self.credentials().load()?;

        let user = if self.credentials().is_authenticated() {
            match self.storage.get_item(USER_KEY)? {
                Some(raw) => match serde_json::from_str::<User>(&raw) {
                    Ok(user) => Some(user),
                    Err(e) => {
                        warn!("Ignoring unreadable stored user: {}", e);
                        None
                    }
                },
                None => None,
            }
        } else {
            None
        };

        self.set_user(user.clone());
        Ok(user)
    }

    pub fn login_url(&self) -> String {
        self.api.login_url()
    }

    /// Exchange the callback's user id for an access token and remember the user.
    pub async fn handle_auth_callback(&self, callback: &AuthCallback) -> Result<User, ApiError> {
        if let Some(error) = &callback.error {
            return Err(ApiError::Unauthenticated(error.clone()));
        }
        let user_id = callback
            .user_id
            .ok_or_else(|| ApiError::Unauthenticated("Missing user id in callback".into()))?;

        let result = self.api.create_token(user_id).await?;
        let jwt = result
            .data
            .filter(|jwt| jwt.access_token.is_some())
            .ok_or_else(|| ApiError::Unauthenticated("No access token issued".into()))?;
        let token = jwt.access_token.as_deref().unwrap_or_default();
        self.credentials().set(token, jwt.expires_at())?;

        let user = User {
            id: user_id,
            email: callback
                .email
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_EMAIL.to_string()),
            name: callback
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            avatar_url: None,
        };
        let blob = serde_json::to_string(&user).map_err(|e| ApiError::Parse(e.to_string()))?;
        self.storage.set_item(USER_KEY, &blob)?;
        self.set_user(Some(user.clone()));

        info!("Signed in as user {}", user_id);
        Ok(user)
    }

    /// Forget tokens and the user. Cached foundation questions stay so
    /// untouched drafts resume into the same session after signing back in.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.credentials().clear()?;
        self.storage.remove_item(USER_KEY)?;
        self.set_user(None);
        info!("Signed out");
        Ok(())
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.read().ok().and_then(|user| user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    pub fn require_user(&self) -> Result<User, ApiError> {
        self.current_user()
            .ok_or_else(|| ApiError::Unauthenticated("Please sign in first".into()))
    }
}
