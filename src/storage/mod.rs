pub mod client;
pub mod types;

pub use client::{InMemoryStorage, LocalStorage, SqliteStorage};
pub use types::*;
