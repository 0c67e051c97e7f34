use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "https://domforgeai.com/api";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    /// Session confidence (0..1) at which domain approval is offered
    pub approval_threshold: f64,
    /// A token this close to expiry is refreshed before use
    pub expiry_buffer_secs: i64,
    pub status_poll_interval_secs: u64,
    /// Balance must be strictly greater than this to start paid actions
    pub min_credits: i64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("domforge"),
            approval_threshold: 0.85,
            expiry_buffer_secs: 60,
            status_poll_interval_secs: 3,
            min_credits: 2,
        }
    }
}
