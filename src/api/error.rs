use super::types::ProblemDetails;
use crate::storage::StorageError;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// A required form field left blank, caught before any request is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field} is required")]
pub struct ValidationError {
    pub field: String,
}

impl ValidationError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{}", problem_message(.problem, .status))]
    Problem { status: u16, problem: ProblemDetails },
    #[error("API Error: {status}")]
    Status { status: u16 },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Empty response from {endpoint}")]
    EmptyResponse { endpoint: String },
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),
    #[error("Missing fields: {0}")]
    Validation(#[from] ValidationError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Insufficient credits: balance is {balance}")]
    InsufficientCredits { balance: i64 },
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

fn problem_message(problem: &ProblemDetails, status: &u16) -> String {
    problem
        .detail
        .clone()
        .or_else(|| problem.title.clone())
        .unwrap_or_else(|| format!("API Error: {}", status))
}

impl ApiError {
    /// Status code of a backend rejection, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Problem { status, .. } | ApiError::Status { status } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn problem_details(&self) -> Option<&ProblemDetails> {
        match self {
            ApiError::Problem { problem, .. } => Some(problem),
            _ => None,
        }
    }

    /// Transient user-facing message for this failure.
    pub fn notice(&self, fallback_title: &str) -> Notice {
        match self {
            ApiError::Problem { problem, .. } => Notice::error(
                problem.title.as_deref().unwrap_or(fallback_title),
                problem.detail.as_deref().unwrap_or("Please try again"),
            ),
            ApiError::Validation(_) => {
                Notice::error("Missing fields", "Please fill in all required fields.")
            }
            ApiError::Unauthenticated(_) => {
                Notice::error("Authentication required", "Please log in to continue.")
            }
            ApiError::InsufficientCredits { .. } => Notice::error(
                "Insufficient credits",
                "You need more credits to continue. Visit My Plan to buy a credit pack.",
            ),
            ApiError::Http(_) => Notice::error(fallback_title, "Please try again"),
            other => Notice::error(fallback_title, &other.to_string()),
        }
    }
}

impl Serialize for ApiError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Title/description pair shown to the user after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn info(title: &str, description: &str) -> Self {
        Self {
            kind: NoticeKind::Info,
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    pub fn error(title: &str, description: &str) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_message_prefers_detail() {
        let err = ApiError::Problem {
            status: 400,
            problem: ProblemDetails {
                title: Some("Bad Request".into()),
                detail: Some("Project name too long".into()),
                ..Default::default()
            },
        };
        assert_eq!(err.to_string(), "Project name too long");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_problem_notice_is_verbatim() {
        let err = ApiError::Problem {
            status: 402,
            problem: ProblemDetails {
                title: Some("Insufficient credits".into()),
                detail: Some("Buy a credit pack".into()),
                ..Default::default()
            },
        };
        let notice = err.notice("Failed to create project");
        assert_eq!(notice.title, "Insufficient credits");
        assert_eq!(notice.description, "Buy a credit pack");
        assert_eq!(notice.kind, NoticeKind::Error);
    }

    #[test]
    fn test_status_error_uses_fallback_title() {
        let err = ApiError::Status { status: 500 };
        let notice = err.notice("Failed to load projects");
        assert_eq!(notice.title, "Failed to load projects");
        assert_eq!(notice.description, "API Error: 500");
    }
}
