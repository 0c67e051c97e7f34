pub mod types;

pub use types::*;

use std::path::PathBuf;

pub const API_URL_ENV: &str = "DOMFORGE_API_URL";
pub const DATA_DIR_ENV: &str = "DOMFORGE_DATA_DIR";

impl ClientConfig {
    /// Defaults overridden by `DOMFORGE_API_URL` and `DOMFORGE_DATA_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.api_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        config
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.api_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.approval_threshold, 0.85);
        assert_eq!(config.expiry_buffer_secs, 60);
        assert_eq!(config.status_poll_interval_secs, 3);
        assert!(config.data_dir.ends_with("domforge"));
    }

    #[test]
    fn test_lookup_overrides() {
        let config = ClientConfig::from_lookup(|key| match key {
            API_URL_ENV => Some("http://localhost:5000/api/".to_string()),
            DATA_DIR_ENV => Some("/tmp/df".to_string()),
            _ => None,
        });

        assert_eq!(config.api_base_url, "http://localhost:5000/api");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/df"));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = ClientConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config, ClientConfig::default());
    }
}
