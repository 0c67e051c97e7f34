use super::aliases::{as_text, Fields, ROUND_ORDER};
use super::analysis::parse_analysis;
use super::types::{AnswerEntry, RoundAnalysis, RoundRecord};
use serde_json::Value;
use tracing::warn;

/// The backend's "no analysis yet" comes as null, an empty string, or the
/// string `"null"`. Anything else counts as a scored round.
pub fn analysis_present(text: Option<&str>) -> bool {
    match text {
        None | Some("") | Some("null") => false,
        Some(_) => true,
    }
}

/// JSON-in-JSON columns: keep strings verbatim, re-serialise embedded values.
fn embedded_json(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub fn normalize_round(raw: &Value) -> RoundRecord {
    let fields = Fields::new(raw, ROUND_ORDER);
    RoundRecord {
        round_id: fields.int("round_id"),
        session_id: fields.int("session_id"),
        round_number: fields.int("round_number").unwrap_or(0),
        round_type: fields.text("round_type"),
        ai_analysis_json: embedded_json(fields.value("ai_analysis_json")),
        questions_answers_json: embedded_json(fields.value("questions_answers_json")),
        confidence_score: fields.float("confidence_score"),
        created_at: fields.text("created_at"),
        answered_at: fields.text("answered_at"),
        analyzed_at: fields.text("analyzed_at"),
    }
}

/// Normalise every record and order them by round number.
pub fn normalize_rounds(raw: &[Value]) -> Vec<RoundRecord> {
    let mut rounds: Vec<RoundRecord> = raw.iter().map(normalize_round).collect();
    rounds.sort_by_key(|r| r.round_number);
    rounds
}

/// Answer map text into ordered pairs. Null answers become empty strings;
/// unreadable text yields no pairs.
pub fn parse_answers(text: Option<&str>) -> Vec<AnswerEntry> {
    let Some(text) = text.filter(|t| analysis_present(Some(t))) else {
        return Vec::new();
    };

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => map
            .into_iter()
            .map(|(key, value)| {
                let answer = match value {
                    Value::Null => String::new(),
                    Value::String(s) => s,
                    other => as_text(&other).unwrap_or_else(|| other.to_string()),
                };
                AnswerEntry { key, value: answer }
            })
            .collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            warn!("Ignoring unreadable answer map: {}", e);
            Vec::new()
        }
    }
}

impl RoundRecord {
    pub fn is_complete(&self) -> bool {
        analysis_present(self.ai_analysis_json.as_deref())
    }

    pub fn answers(&self) -> Vec<AnswerEntry> {
        parse_answers(self.questions_answers_json.as_deref())
    }

    /// Parsed analysis, `None` while the round is unscored or unreadable.
    pub fn analysis(&self) -> Option<RoundAnalysis> {
        if !self.is_complete() {
            return None;
        }
        self.ai_analysis_json.as_deref().and_then(parse_analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_casings_normalize_identically() {
        let camel = json!({
            "roundId": 11, "sessionId": 4, "roundNumber": 2, "roundType": "followup",
            "aiAnalysisJson": "{\"round_metadata\":{}}",
            "questionsAnswersJson": "{\"FQ1\":\"Postgres\"}",
            "confidenceScore": 0.7, "createdAt": "2026-01-01T00:00:00Z",
            "answeredAt": null, "analyzedAt": "2026-01-02T00:00:00Z"
        });
        let pascal = json!({
            "RoundId": 11, "SessionId": 4, "RoundNumber": 2, "RoundType": "followup",
            "AiAnalysisJson": "{\"round_metadata\":{}}",
            "QuestionsAnswersJson": "{\"FQ1\":\"Postgres\"}",
            "ConfidenceScore": 0.7, "CreatedAt": "2026-01-01T00:00:00Z",
            "AnsweredAt": null, "AnalyzedAt": "2026-01-02T00:00:00Z"
        });
        let snake = json!({
            "round_id": 11, "session_id": 4, "round_number": 2, "round_type": "followup",
            "ai_analysis_json": "{\"round_metadata\":{}}",
            "questions_answers_json": "{\"FQ1\":\"Postgres\"}",
            "confidence_score": 0.7, "created_at": "2026-01-01T00:00:00Z",
            "answered_at": null, "analyzed_at": "2026-01-02T00:00:00Z"
        });

        let a = normalize_round(&camel);
        assert_eq!(a, normalize_round(&pascal));
        assert_eq!(a, normalize_round(&snake));
        assert_eq!(a.round_number, 2);
        assert_eq!(a.round_id, Some(11));
        assert!(a.is_complete());
    }

    #[test]
    fn test_null_sentinels_are_incomplete() {
        for raw in [json!(null), json!(""), json!("null")] {
            let round = normalize_round(&json!({"roundNumber": 1, "aiAnalysisJson": raw}));
            assert!(!round.is_complete(), "{:?} should be incomplete", round.ai_analysis_json);
            assert!(round.analysis().is_none());
        }
        let missing = normalize_round(&json!({"roundNumber": 1}));
        assert!(!missing.is_complete());
    }

    #[test]
    fn test_other_text_is_complete() {
        assert!(analysis_present(Some("{}")));
        assert!(analysis_present(Some("not even json")));
        assert!(analysis_present(Some("  ")));
        assert!(analysis_present(Some(" null ")));
    }

    #[test]
    fn test_padded_analysis_text_is_complete() {
        for raw in ["  ", " null "] {
            let round = normalize_round(&json!({"roundNumber": 1, "aiAnalysisJson": raw}));
            assert!(round.is_complete(), "{:?} should be complete", raw);
        }
    }

    #[test]
    fn test_embedded_object_is_kept_as_text() {
        let round = normalize_round(&json!({
            "roundNumber": 1,
            "aiAnalysisJson": {"round_metadata": {"round_number": 1}}
        }));
        assert!(round.is_complete());
        assert_eq!(round.analysis().unwrap().round_metadata.round_number, 1);
    }

    #[test]
    fn test_rounds_sorted_ascending() {
        let rounds = normalize_rounds(&[
            json!({"roundNumber": 2}),
            json!({"round_number": 0}),
            json!({"RoundNumber": 1}),
        ]);
        let numbers: Vec<i64> = rounds.iter().map(|r| r.round_number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
    }

    #[test]
    fn test_answers_keep_order_and_blank_nulls() {
        let answers = parse_answers(Some(r#"{"FQ2": "b", "FQ1": null, "FQ3": 7}"#));
        assert_eq!(
            answers,
            vec![
                AnswerEntry::new("FQ2", "b"),
                AnswerEntry::new("FQ1", ""),
                AnswerEntry::new("FQ3", "7"),
            ]
        );
    }

    #[test]
    fn test_unreadable_answers_are_empty() {
        assert!(parse_answers(Some("{broken")).is_empty());
        assert!(parse_answers(Some("[1,2]")).is_empty());
        assert!(parse_answers(None).is_empty());
    }
}
