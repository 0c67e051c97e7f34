pub mod credentials;
pub mod manager;
pub mod types;

pub use credentials::{CredentialStore, Credentials};
pub use manager::AuthManager;
pub use types::*;
