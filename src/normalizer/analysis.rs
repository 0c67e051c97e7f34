use super::aliases::{Fields, ANALYSIS_ORDER};
use super::types::*;
use serde_json::Value;
use tracing::{debug, warn};

const DOMAIN_MARKERS: &[&str] = &[
    "analysis_summary",
    "identified_domains",
    "recommended_microservices_count",
];

/// Parse analysis text. Unreadable or non-object JSON yields `None`,
/// which callers treat as "no analysis yet".
pub fn parse_analysis(text: &str) -> Option<RoundAnalysis> {
    let value = match serde_json::from_str::<Value>(text) {
        Ok(Value::String(inner)) => serde_json::from_str::<Value>(&inner).ok()?,
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring unreadable analysis payload: {}", e);
            return None;
        }
    };
    normalize_analysis(&value)
}

/// A bare domain-analysis result: domain fields present, no round wrapper.
pub fn is_domain_analysis_shape(value: &Value) -> bool {
    let fields = Fields::new(value, ANALYSIS_ORDER);
    DOMAIN_MARKERS.iter().any(|name| fields.has(name))
}

fn has_round_metadata(fields: &Fields<'_>) -> bool {
    fields.has("round_metadata")
}

pub fn normalize_analysis(value: &Value) -> Option<RoundAnalysis> {
    if !value.is_object() {
        return None;
    }
    let fields = Fields::new(value, ANALYSIS_ORDER);

    if is_domain_analysis_shape(value) && !has_round_metadata(&fields) {
        debug!("Wrapping bare domain analysis result");
        return Some(wrap_domain_analysis(value));
    }

    let last_analysis_data = match fields.nested("last_analysis_data") {
        Some(nested) => Some(domain_analysis_from(nested)),
        None if is_domain_analysis_shape(value) => Some(domain_analysis_from(fields)),
        None => None,
    };

    Some(RoundAnalysis {
        round_metadata: fields
            .nested("round_metadata")
            .map(round_metadata_from)
            .unwrap_or_else(|| RoundMetadata {
                requires_another_round: true,
                ..Default::default()
            }),
        questions: fields.objects("questions").into_iter().map(question_from).collect(),
        refined_domain_analysis: fields
            .nested("refined_domain_analysis")
            .map(refined_analysis_from),
        updated_domains: fields
            .objects("updated_domains")
            .into_iter()
            .map(updated_domain_from)
            .collect(),
        next_round_focus: fields.strings("next_round_focus"),
        last_analysis_data,
        round_id: fields.int("round_id").unwrap_or(0),
        round_number: fields.int("round_number").unwrap_or(0),
    })
}

fn wrap_domain_analysis(value: &Value) -> RoundAnalysis {
    let domain = domain_analysis_from(Fields::new(value, ANALYSIS_ORDER));
    let summary = domain.analysis_summary.clone().unwrap_or_default();

    RoundAnalysis {
        round_metadata: RoundMetadata {
            round_number: 0,
            confidence_score_before: 0.0,
            confidence_score_after_expected: summary.confidence_score,
            questions_count: 0,
            requires_another_round: summary.requires_followup.unwrap_or(false),
            reasoning: summary.reasoning,
        },
        last_analysis_data: Some(domain),
        ..Default::default()
    }
}

fn round_metadata_from(f: Fields<'_>) -> RoundMetadata {
    RoundMetadata {
        round_number: f.int("round_number").unwrap_or(0),
        confidence_score_before: f.float("confidence_score_before").unwrap_or(0.0),
        confidence_score_after_expected: f
            .float("confidence_score_after_expected")
            .unwrap_or(0.0),
        questions_count: f.int("questions_count").unwrap_or(0),
        requires_another_round: f.flag("requires_another_round").unwrap_or(true),
        reasoning: f.text("reasoning"),
    }
}

fn question_from(f: Fields<'_>) -> Question {
    let follow_up_if_answer = f
        .value("follow_up_if_answer")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| super::aliases::as_text(v).map(|text| (k.clone(), text)))
                .collect()
        })
        .unwrap_or_default();

    Question {
        question_id: f.int("question_id").unwrap_or(0),
        question: f
            .value_or("question", &["questionText", "question_text", "QuestionText"])
            .and_then(super::aliases::as_text),
        reason: f.text("reason"),
        affects_domains: f.strings("affects_domains"),
        priority: f.text("priority"),
        expected_answer_type: f.text("expected_answer_type"),
        follow_up_if_answer,
    }
}

fn refined_analysis_from(f: Fields<'_>) -> RefinedDomainAnalysis {
    RefinedDomainAnalysis {
        changes_from_previous: f
            .objects("changes_from_previous")
            .into_iter()
            .map(|c| ChangeFromPrevious {
                change_type: c.text("change_type"),
                description: c.text("description"),
            })
            .collect(),
        identified_risks: f
            .objects("identified_risks")
            .into_iter()
            .map(|r| IdentifiedRisk {
                risk: r.text("risk"),
                severity: r.text("severity"),
                description: r.text("description"),
            })
            .collect(),
        assumptions_to_validate: f.strings("assumptions_to_validate"),
    }
}

fn updated_domain_from(f: Fields<'_>) -> UpdatedDomain {
    UpdatedDomain {
        domain_name: f.text("domain_name"),
        estimated_entities: f.int("estimated_entities").unwrap_or(0),
        changes: f.text("changes"),
        new_probable_entities: f.strings("new_probable_entities"),
    }
}

/// Canonical domain-analysis result from any casing; missing lists are empty.
pub fn parse_domain_analysis(value: &Value) -> Option<DomainAnalysisResult> {
    value
        .is_object()
        .then(|| domain_analysis_from(Fields::new(value, ANALYSIS_ORDER)))
}

fn domain_analysis_from(f: Fields<'_>) -> DomainAnalysisResult {
    DomainAnalysisResult {
        analysis_summary: f.nested("analysis_summary").map(|s| AnalysisSummary {
            total_domains_identified: s.int("total_domains_identified").unwrap_or(0),
            confidence_score: s.float("confidence_score").unwrap_or(0.0),
            requires_followup: s.flag("requires_followup"),
            reasoning: s.text("reasoning"),
        }),
        identified_domains: f
            .objects("identified_domains")
            .into_iter()
            .map(|d| IdentifiedDomain {
                domain_name: d.text("domain_name"),
                description: d.text("description"),
                business_capability: d.text("business_capability"),
                estimated_entities: d.int("estimated_entities").unwrap_or(0),
                probable_entities: d.strings("probable_entities"),
                key_responsibilities: d.strings("key_responsibilities"),
                user_types_served: d.strings("user_types_served"),
                confidence: d.float("confidence").unwrap_or(0.0),
            })
            .collect(),
        domain_relationships: f
            .objects("domain_relationships")
            .into_iter()
            .map(|r| DomainRelationship {
                from_domain: r.text("from_domain"),
                to_domain: r.text("to_domain"),
                relationship_type: r.text("relationship_type"),
                interaction_pattern: r.text("interaction_pattern"),
                description: r.text("description"),
                data_shared: r.strings("data_shared"),
                notes: r.text("notes"),
            })
            .collect(),
        cross_cutting_concerns: f
            .objects("cross_cutting_concerns")
            .into_iter()
            .map(|c| CrossCuttingConcern {
                concern: c.text("concern"),
                affected_domains: c.strings("affected_domains"),
                recommendation: c.text("recommendation"),
                notes: c.text("notes"),
            })
            .collect(),
        integration_points: f
            .objects("integration_points")
            .into_iter()
            .map(|i| IntegrationPoint {
                external_system: i.text("external_system"),
                integrating_domain: i.text("integrating_domain"),
                integration_type: i.text("integration_type"),
                purpose: i.text("purpose"),
                criticality: i.text("criticality"),
            })
            .collect(),
        compliance_impacts: f
            .objects("compliance_impacts")
            .into_iter()
            .map(|c| ComplianceImpact {
                regulation: c.text("regulation"),
                affected_domains: c.strings("affected_domains"),
                requirements: c.strings("requirements"),
                architectural_impact: c.text("architectural_impact"),
            })
            .collect(),
        scale_considerations: f.nested("scale_considerations").map(|s| ScaleConsiderations {
            expected_load: s.text("expected_load"),
            high_traffic_domains: s.strings("high_traffic_domains"),
            recommendations: s.strings("recommendations"),
        }),
        potential_issues: f
            .objects("potential_issues")
            .into_iter()
            .map(|p| PotentialIssue {
                issue: p.text("issue"),
                description: p.text("description"),
                recommendation: p.text("recommendation"),
                severity: p.text("severity"),
            })
            .collect(),
        recommended_microservices_count: f.nested("recommended_microservices_count").map(|r| {
            RecommendedMicroservicesCount {
                minimum: r.int("minimum").unwrap_or(0),
                optimal: r.int("optimal").unwrap_or(0),
                maximum: r.int("maximum").unwrap_or(0),
                rationale: r.text("rationale"),
                optimal_service_names: r.strings("optimal_service_names"),
            }
        }),
    }
}
