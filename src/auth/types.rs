use reqwest::Url;
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_NAME: &str = "User";
pub const DEFAULT_USER_EMAIL: &str = "user@example.com";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Parameters the login redirect lands with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthCallback {
    pub user_id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub error: Option<String>,
}

impl AuthCallback {
    pub fn for_user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    /// Parse a callback query such as `userId=7&name=Ada%20L&email=a%40b.c`.
    /// A leading `?` or a full callback URL is accepted as well.
    pub fn from_query(raw: &str) -> Self {
        let query = match raw.split_once('?') {
            Some((_, query)) => query,
            None => raw,
        };
        let Ok(url) = Url::parse(&format!("http://callback.local/?{}", query)) else {
            return Self::default();
        };

        let mut callback = Self::default();
        for (key, value) in url.query_pairs() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "userId" => callback.user_id = value.parse().ok(),
                "name" => callback.name = Some(value.to_string()),
                "email" => callback.email = Some(value.to_string()),
                "error" => callback.error = Some(value.to_string()),
                _ => {}
            }
        }
        callback
    }
}
