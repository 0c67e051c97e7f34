pub mod api_client;
pub mod error;
pub mod types;

pub use api_client::{ApiClient, FollowupOutcome};
pub use error::*;
pub use types::*;
