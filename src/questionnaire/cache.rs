use crate::api::FoundationQuestion;
use crate::storage::{foundation_questions_key, LocalStorage};
use std::sync::Arc;
use tracing::warn;

/// Foundation questions per session, kept locally because the backend
/// cannot hand them out again for an existing session.
#[derive(Clone)]
pub struct FoundationQuestionCache {
    storage: Arc<dyn LocalStorage>,
}

impl FoundationQuestionCache {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    pub fn cache(&self, session_id: i64, questions: &[FoundationQuestion]) {
        let raw = match serde_json::to_string(questions) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to encode foundation questions: {}", e);
                return;
            }
        };
        if let Err(e) = self
            .storage
            .set_item(&foundation_questions_key(session_id), &raw)
        {
            warn!("Failed to cache foundation questions for {}: {}", session_id, e);
        }
    }

    pub fn get(&self, session_id: i64) -> Option<Vec<FoundationQuestion>> {
        let raw = match self.storage.get_item(&foundation_questions_key(session_id)) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read foundation questions for {}: {}", session_id, e);
                return None;
            }
        };

        let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
        if !value.is_array() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    pub fn clear(&self, session_id: i64) {
        if let Err(e) = self.storage.remove_item(&foundation_questions_key(session_id)) {
            warn!("Failed to clear foundation questions for {}: {}", session_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;

    fn question(id: i64, text: &str) -> FoundationQuestion {
        FoundationQuestion {
            question_id: id,
            question: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_cache_and_get() {
        let cache = FoundationQuestionCache::new(Arc::new(InMemoryStorage::new()));
        cache.cache(5, &[question(1, "What?"), question(2, "Who?")]);

        let questions = cache.get(5).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].question.as_deref(), Some("Who?"));
        assert!(cache.get(6).is_none());
    }

    #[test]
    fn test_non_array_reads_as_absent() {
        let storage = Arc::new(InMemoryStorage::new());
        let cache = FoundationQuestionCache::new(storage.clone());

        storage.set_item(&foundation_questions_key(1), r#"{"questionId": 1}"#).unwrap();
        assert!(cache.get(1).is_none());

        storage.set_item(&foundation_questions_key(1), "not json").unwrap();
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn test_clear() {
        let cache = FoundationQuestionCache::new(Arc::new(InMemoryStorage::new()));
        cache.cache(3, &[question(1, "What?")]);
        cache.clear(3);
        assert!(cache.get(3).is_none());
    }
}
