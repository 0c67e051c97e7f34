use thiserror::Error;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const TOKEN_EXPIRATION_KEY: &str = "token_expiration";
pub const USER_KEY: &str = "user";

pub const FOUNDATION_QUESTIONS_PREFIX: &str = "df_foundation_questions_";

/// Key under which the foundation questions of a session are cached.
pub fn foundation_questions_key(session_id: i64) -> String {
    format!("{}{}", FOUNDATION_QUESTIONS_PREFIX, session_id)
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Failed to create data directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage lock poisoned")]
    Poisoned,
}
