use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub user_id: i64,
    pub project_name: Option<String>,
    pub project_description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationSession {
    pub session_id: i64,
    pub user_id: i64,
    pub project_name: Option<String>,
    pub project_description: Option<String>,
    pub current_phase: Option<String>,
    pub domain_analysis_json: Option<String>,
    pub locked_architecture: Option<String>,
    pub confidence_score: Option<f64>,
    pub total_rounds: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub completed_at: Option<String>,
}

/// Coarse lifecycle of a session as reported by `currentPhase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Foundation,
    InAnalysis,
    Generating,
    Completed,
    Failed,
}

impl SessionPhase {
    pub fn parse(raw: Option<&str>) -> Self {
        let normalized = raw.unwrap_or_default().trim().to_ascii_lowercase();
        match normalized.as_str() {
            "generating_packages" | "generating" | "queued" => SessionPhase::Generating,
            "completed" => SessionPhase::Completed,
            "failed" => SessionPhase::Failed,
            "foundation" => SessionPhase::Foundation,
            _ => SessionPhase::InAnalysis,
        }
    }
}

impl ConversationSession {
    pub fn phase(&self) -> SessionPhase {
        SessionPhase::parse(self.current_phase.as_deref())
    }

    /// Confidence on a 0..1 scale; some payloads report percentages.
    pub fn confidence(&self) -> f64 {
        normalize_confidence(self.confidence_score)
    }

    pub fn display_name(&self) -> String {
        self.project_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Project {}", self.session_id))
    }
}

pub fn normalize_confidence(score: Option<f64>) -> f64 {
    match score {
        Some(s) if s.is_finite() && s > 1.0 => (s / 100.0).min(1.0),
        Some(s) if s.is_finite() && s > 0.0 => s,
        _ => 0.0,
    }
}

/// Session plus its raw round records. Rounds stay untyped here because
/// their field spelling varies between endpoints; see `crate::normalizer`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionMetadata {
    pub session: ConversationSession,
    #[serde(alias = "Rounds")]
    pub rounds: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FoundationQuestion {
    #[serde(alias = "question_id")]
    pub question_id: i64,
    pub section_id: i64,
    pub question_order: i64,
    #[serde(alias = "questionText")]
    pub question: Option<String>,
    pub question_type_id: i64,
    pub question_type_name: Option<String>,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StartSessionResponse {
    pub session: ConversationSession,
    pub foundation_questions: Vec<FoundationQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitAnswersRequest {
    pub answers: serde_json::Map<String, serde_json::Value>,
    // The backend spells it this way.
    #[serde(rename = "roundeId", skip_serializing_if = "Option::is_none")]
    pub round_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageDto {
    pub package_id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub order: i64,
    pub status: Option<String>,
    pub recommended_tool: Option<String>,
    pub estimated_time_minutes: i64,
    pub dependencies: Option<Vec<String>>,
    pub file_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationStatusResponse {
    pub current_phase: Option<String>,
    pub progress: f64,
    pub current_package: Option<String>,
    pub packages: Option<Vec<PackageDto>>,
    pub error_message: Option<String>,
}

impl GenerationStatusResponse {
    pub fn phase(&self) -> SessionPhase {
        SessionPhase::parse(self.current_phase.as_deref())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase(), SessionPhase::Completed | SessionPhase::Failed)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanHighlight {
    pub text: Option<String>,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanEntity {
    pub id: i64,
    pub stripe_price_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_monthly: f64,
    pub price_yearly: f64,
    pub domain_credits: i64,
    pub microservice_credits: i64,
    pub is_contact_sales: bool,
    pub active: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub credits_summary: Option<String>,
    pub is_domain_only: bool,
    pub pricing_display: Option<String>,
    pub highlights: Option<Vec<PlanHighlight>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CreditPackEntity {
    pub credit_pack_id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub credits: i64,
    pub price: f64,
    pub active: bool,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreditPackRequest {
    pub user_id: i64,
    pub pack_id: i64,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserCreditsEntity {
    pub user_id: i64,
    pub credits_balance: i64,
    pub last_reset: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSubscriptionEntity {
    pub user_id: i64,
    pub plan_id: i64,
    pub status: Option<String>,
    pub current_period_end: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JwtRequest {
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct JwtResponse {
    pub access_token: Option<String>,
    pub expiration_time: Option<String>,
    pub token_type: Option<String>,
}

impl JwtResponse {
    /// Parses `expirationTime`, accepting timestamps with or without an offset.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.expiration_time.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub user_id: i64,
    pub plan_id: i64,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionRequest {
    pub user_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutSession {
    pub session_id: Option<String>,
    pub checkout_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrategyResult<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<std::collections::BTreeMap<String, String>>,
    #[serde(default)]
    pub has_errors: bool,
}

/// Some endpoints answer with a single object where a list is expected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub status: Option<u16>,
    pub detail: Option<String>,
    pub instance: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserInputRequest {
    pub user_id: Option<i64>,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub title: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_phase_parsing() {
        assert_eq!(SessionPhase::parse(Some("generating_packages")), SessionPhase::Generating);
        assert_eq!(SessionPhase::parse(Some("queued")), SessionPhase::Generating);
        assert_eq!(SessionPhase::parse(Some("Failed")), SessionPhase::Failed);
        assert_eq!(SessionPhase::parse(Some("completed")), SessionPhase::Completed);
        assert_eq!(SessionPhase::parse(Some("In analyze")), SessionPhase::InAnalysis);
        assert_eq!(SessionPhase::parse(None), SessionPhase::InAnalysis);
    }

    #[test]
    fn test_confidence_accepts_percentages() {
        assert_eq!(normalize_confidence(Some(0.87)), 0.87);
        assert_eq!(normalize_confidence(Some(87.0)), 0.87);
        assert_eq!(normalize_confidence(None), 0.0);
        assert_eq!(normalize_confidence(Some(-3.0)), 0.0);
    }

    #[test]
    fn test_foundation_question_accepts_both_id_spellings() {
        let a: FoundationQuestion =
            serde_json::from_value(json!({"question_id": 3, "question": "Who uses it?"})).unwrap();
        let b: FoundationQuestion =
            serde_json::from_value(json!({"questionId": 3, "questionText": "Who uses it?"})).unwrap();
        assert_eq!(a.question_id, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_submit_request_uses_backend_round_id_spelling() {
        let mut answers = serde_json::Map::new();
        answers.insert("FQ1".to_string(), json!("Postgres"));
        let request = SubmitAnswersRequest {
            answers,
            round_id: Some(12),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"answers": {"FQ1": "Postgres"}, "roundeId": 12}));
    }

    #[test]
    fn test_one_or_many() {
        let one: OneOrMany<PlanEntity> = serde_json::from_value(json!({"id": 1})).unwrap();
        let many: OneOrMany<PlanEntity> =
            serde_json::from_value(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(one.into_vec().len(), 1);
        assert_eq!(many.into_vec().len(), 2);
    }

    #[test]
    fn test_jwt_expiration_without_offset() {
        let jwt = JwtResponse {
            access_token: Some("t".into()),
            expiration_time: Some("2026-03-01T10:00:00".into()),
            token_type: None,
        };
        assert_eq!(jwt.expires_at().unwrap().to_rfc3339(), "2026-03-01T10:00:00+00:00");
    }
}
