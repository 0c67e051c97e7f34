use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One round record in canonical form, whatever casing the backend used.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RoundRecord {
    pub round_id: Option<i64>,
    pub session_id: Option<i64>,
    pub round_number: i64,
    pub round_type: Option<String>,
    pub ai_analysis_json: Option<String>,
    pub questions_answers_json: Option<String>,
    pub confidence_score: Option<f64>,
    pub created_at: Option<String>,
    pub answered_at: Option<String>,
    pub analyzed_at: Option<String>,
}

/// One question-key/answer pair, in the order the backend stored them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntry {
    pub key: String,
    pub value: String,
}

impl AnswerEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn is_answered(&self) -> bool {
        !self.value.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RoundMetadata {
    pub round_number: i64,
    pub confidence_score_before: f64,
    pub confidence_score_after_expected: f64,
    pub questions_count: i64,
    pub requires_another_round: bool,
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub question_id: i64,
    pub question: Option<String>,
    pub reason: Option<String>,
    pub affects_domains: Vec<String>,
    pub priority: Option<String>,
    pub expected_answer_type: Option<String>,
    pub follow_up_if_answer: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChangeFromPrevious {
    pub change_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdentifiedRisk {
    pub risk: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RefinedDomainAnalysis {
    pub changes_from_previous: Vec<ChangeFromPrevious>,
    pub identified_risks: Vec<IdentifiedRisk>,
    pub assumptions_to_validate: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdatedDomain {
    pub domain_name: Option<String>,
    pub estimated_entities: i64,
    pub changes: Option<String>,
    pub new_probable_entities: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSummary {
    pub total_domains_identified: i64,
    pub confidence_score: f64,
    pub requires_followup: Option<bool>,
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdentifiedDomain {
    pub domain_name: Option<String>,
    pub description: Option<String>,
    pub business_capability: Option<String>,
    pub estimated_entities: i64,
    pub probable_entities: Vec<String>,
    pub key_responsibilities: Vec<String>,
    pub user_types_served: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DomainRelationship {
    pub from_domain: Option<String>,
    pub to_domain: Option<String>,
    pub relationship_type: Option<String>,
    pub interaction_pattern: Option<String>,
    pub description: Option<String>,
    pub data_shared: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CrossCuttingConcern {
    pub concern: Option<String>,
    pub affected_domains: Vec<String>,
    pub recommendation: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IntegrationPoint {
    pub external_system: Option<String>,
    pub integrating_domain: Option<String>,
    pub integration_type: Option<String>,
    pub purpose: Option<String>,
    pub criticality: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComplianceImpact {
    pub regulation: Option<String>,
    pub affected_domains: Vec<String>,
    pub requirements: Vec<String>,
    pub architectural_impact: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScaleConsiderations {
    pub expected_load: Option<String>,
    pub high_traffic_domains: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PotentialIssue {
    pub issue: Option<String>,
    pub description: Option<String>,
    pub recommendation: Option<String>,
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecommendedMicroservicesCount {
    pub minimum: i64,
    pub optimal: i64,
    pub maximum: i64,
    pub rationale: Option<String>,
    pub optimal_service_names: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DomainAnalysisResult {
    pub analysis_summary: Option<AnalysisSummary>,
    pub identified_domains: Vec<IdentifiedDomain>,
    pub domain_relationships: Vec<DomainRelationship>,
    pub cross_cutting_concerns: Vec<CrossCuttingConcern>,
    pub integration_points: Vec<IntegrationPoint>,
    pub compliance_impacts: Vec<ComplianceImpact>,
    pub scale_considerations: Option<ScaleConsiderations>,
    pub potential_issues: Vec<PotentialIssue>,
    pub recommended_microservices_count: Option<RecommendedMicroservicesCount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RoundAnalysis {
    pub round_metadata: RoundMetadata,
    pub questions: Vec<Question>,
    pub refined_domain_analysis: Option<RefinedDomainAnalysis>,
    pub updated_domains: Vec<UpdatedDomain>,
    pub next_round_focus: Vec<String>,
    pub last_analysis_data: Option<DomainAnalysisResult>,
    pub round_id: i64,
    pub round_number: i64,
}

impl RoundAnalysis {
    pub fn confidence(&self) -> f64 {
        self.round_metadata.confidence_score_after_expected
    }

    pub fn requires_another_round(&self) -> bool {
        self.round_metadata.requires_another_round
    }
}
