use crate::api::GenerationStatusResponse;
use crate::normalizer::{DomainAnalysisResult, RoundAnalysis};
use crate::questionnaire::{ChatMessage, MessageKind, MessageMetadata};

fn or_dash(value: Option<&str>) -> &str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or("-")
}

fn percent(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

fn joined(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

fn section(lines: &mut Vec<String>, title: &str) {
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!("{}:", title));
}

/// Text panel for one round's analysis: metadata, risks and next questions.
pub fn render_round_analysis(analysis: &RoundAnalysis) -> String {
    let meta = &analysis.round_metadata;
    let mut lines = vec![
        format!("Round {}", meta.round_number),
        format!(
            "Confidence: {} (expected {})",
            percent(meta.confidence_score_before),
            percent(meta.confidence_score_after_expected)
        ),
        format!(
            "Another round required: {}",
            if meta.requires_another_round { "yes" } else { "no" }
        ),
    ];
    if let Some(reasoning) = meta.reasoning.as_deref().filter(|r| !r.trim().is_empty()) {
        lines.push(format!("Reasoning: {}", reasoning));
    }

    if let Some(refined) = &analysis.refined_domain_analysis {
        if !refined.changes_from_previous.is_empty() {
            section(&mut lines, "Changes from previous round");
            for change in &refined.changes_from_previous {
                lines.push(format!(
                    "- [{}] {}",
                    or_dash(change.change_type.as_deref()),
                    or_dash(change.description.as_deref())
                ));
            }
        }
        if !refined.identified_risks.is_empty() {
            section(&mut lines, "Identified risks");
            for risk in &refined.identified_risks {
                lines.push(format!(
                    "- {} ({}): {}",
                    or_dash(risk.risk.as_deref()),
                    or_dash(risk.severity.as_deref()),
                    or_dash(risk.description.as_deref())
                ));
            }
        }
        if !refined.assumptions_to_validate.is_empty() {
            section(&mut lines, "Assumptions to validate");
            lines.extend(refined.assumptions_to_validate.iter().map(|a| format!("- {}", a)));
        }
    }

    if !analysis.updated_domains.is_empty() {
        section(&mut lines, "Updated domains");
        for domain in &analysis.updated_domains {
            lines.push(format!(
                "- {} (~{} entities)",
                or_dash(domain.domain_name.as_deref()),
                domain.estimated_entities
            ));
            if let Some(changes) = domain.changes.as_deref().filter(|c| !c.trim().is_empty()) {
                lines.push(format!("  {}", changes));
            }
            if !domain.new_probable_entities.is_empty() {
                lines.push(format!("  New entities: {}", joined(&domain.new_probable_entities)));
            }
        }
    }

    if !analysis.questions.is_empty() {
        section(&mut lines, "Next questions");
        for question in &analysis.questions {
            lines.push(format!(
                "- [{}] {}",
                or_dash(question.priority.as_deref()),
                or_dash(question.question.as_deref())
            ));
        }
    }

    if !analysis.next_round_focus.is_empty() {
        section(&mut lines, "Next round focus");
        lines.extend(analysis.next_round_focus.iter().map(|f| format!("- {}", f)));
    }

    lines.join("\n")
}

/// Text panel for a full domain analysis.
pub fn render_domain_analysis(result: &DomainAnalysisResult) -> String {
    let mut lines = Vec::new();

    section(&mut lines, "Summary");
    match &result.analysis_summary {
        Some(summary) => {
            lines.push(format!("- Domains identified: {}", summary.total_domains_identified));
            lines.push(format!("- Confidence: {}", percent(summary.confidence_score)));
            if let Some(reasoning) = summary.reasoning.as_deref() {
                lines.push(format!("- Reasoning: {}", reasoning));
            }
        }
        None => lines.push("- No summary available.".to_string()),
    }

    section(&mut lines, "Domains");
    if result.identified_domains.is_empty() {
        lines.push("- None identified.".to_string());
    }
    for domain in &result.identified_domains {
        lines.push(format!(
            "- {} ({} confidence, ~{} entities)",
            or_dash(domain.domain_name.as_deref()),
            percent(domain.confidence),
            domain.estimated_entities
        ));
        if let Some(description) = domain.description.as_deref() {
            lines.push(format!("  {}", description));
        }
        if let Some(capability) = domain.business_capability.as_deref() {
            lines.push(format!("  Capability: {}", capability));
        }
        if !domain.probable_entities.is_empty() {
            lines.push(format!("  Entities: {}", joined(&domain.probable_entities)));
        }
        if !domain.key_responsibilities.is_empty() {
            lines.push(format!("  Responsibilities: {}", joined(&domain.key_responsibilities)));
        }
        if !domain.user_types_served.is_empty() {
            lines.push(format!("  Serves: {}", joined(&domain.user_types_served)));
        }
    }

    if !result.domain_relationships.is_empty() {
        section(&mut lines, "Relationships");
        for rel in &result.domain_relationships {
            lines.push(format!(
                "- {} -> {} [{}, {}]",
                or_dash(rel.from_domain.as_deref()),
                or_dash(rel.to_domain.as_deref()),
                or_dash(rel.relationship_type.as_deref()),
                or_dash(rel.interaction_pattern.as_deref())
            ));
            if let Some(description) = rel.description.as_deref() {
                lines.push(format!("  {}", description));
            }
            if !rel.data_shared.is_empty() {
                lines.push(format!("  Data shared: {}", joined(&rel.data_shared)));
            }
        }
    }

    if !result.cross_cutting_concerns.is_empty() {
        section(&mut lines, "Cross-cutting concerns");
        for concern in &result.cross_cutting_concerns {
            lines.push(format!(
                "- {} (affects {})",
                or_dash(concern.concern.as_deref()),
                joined(&concern.affected_domains)
            ));
            if let Some(recommendation) = concern.recommendation.as_deref() {
                lines.push(format!("  Recommendation: {}", recommendation));
            }
        }
    }

    if !result.integration_points.is_empty() {
        section(&mut lines, "Integration points");
        for point in &result.integration_points {
            lines.push(format!(
                "- {} <-> {} [{}, {}]: {}",
                or_dash(point.external_system.as_deref()),
                or_dash(point.integrating_domain.as_deref()),
                or_dash(point.integration_type.as_deref()),
                or_dash(point.criticality.as_deref()),
                or_dash(point.purpose.as_deref())
            ));
        }
    }

    if !result.compliance_impacts.is_empty() {
        section(&mut lines, "Compliance");
        for impact in &result.compliance_impacts {
            lines.push(format!(
                "- {} (affects {})",
                or_dash(impact.regulation.as_deref()),
                joined(&impact.affected_domains)
            ));
            lines.extend(impact.requirements.iter().map(|r| format!("  * {}", r)));
            if let Some(architectural) = impact.architectural_impact.as_deref() {
                lines.push(format!("  Impact: {}", architectural));
            }
        }
    }

    if let Some(scale) = &result.scale_considerations {
        section(&mut lines, "Scale");
        lines.push(format!("- Expected load: {}", or_dash(scale.expected_load.as_deref())));
        lines.push(format!("- High-traffic domains: {}", joined(&scale.high_traffic_domains)));
        lines.extend(scale.recommendations.iter().map(|r| format!("  * {}", r)));
    }

    if !result.potential_issues.is_empty() {
        section(&mut lines, "Potential issues");
        for issue in &result.potential_issues {
            lines.push(format!(
                "- {} ({}): {}",
                or_dash(issue.issue.as_deref()),
                or_dash(issue.severity.as_deref()),
                or_dash(issue.description.as_deref())
            ));
            if let Some(recommendation) = issue.recommendation.as_deref() {
                lines.push(format!("  Recommendation: {}", recommendation));
            }
        }
    }

    if let Some(count) = &result.recommended_microservices_count {
        section(&mut lines, "Recommended microservices");
        lines.push(format!(
            "- {} optimal (min {}, max {})",
            count.optimal, count.minimum, count.maximum
        ));
        if !count.optimal_service_names.is_empty() {
            lines.push(format!("  Services: {}", joined(&count.optimal_service_names)));
        }
        if let Some(rationale) = count.rationale.as_deref() {
            lines.push(format!("  {}", rationale));
        }
    }

    lines.join("\n")
}

/// Transcript as it reads in the chat view; analysis metadata is expanded
/// under the message that carries it when `expand` is set.
pub fn render_transcript(messages: &[ChatMessage], expand: bool) -> String {
    let mut lines = Vec::new();
    for message in messages {
        match message.kind {
            MessageKind::System => {
                if !lines.is_empty() {
                    lines.push(String::new());
                }
                lines.push(format!("== {} ==", message.content));
            }
            MessageKind::Ai => lines.push(format!("AI: {}", message.content)),
            MessageKind::User => lines.push(format!("You: {}", message.content)),
        }

        if !expand {
            continue;
        }
        let panel = match &message.metadata {
            Some(MessageMetadata::RoundAnalysis(analysis)) => render_round_analysis(analysis),
            Some(MessageMetadata::DomainAnalysis(result)) => render_domain_analysis(result),
            None => continue,
        };
        lines.extend(panel.lines().map(|line| format!("    {}", line)));
    }
    lines.join("\n")
}

/// One status line plus one line per package.
pub fn render_generation_status(status: &GenerationStatusResponse) -> String {
    let mut lines = vec![format!(
        "Phase: {} ({:.0}%)",
        or_dash(status.current_phase.as_deref()),
        status.progress
    )];
    if let Some(current) = status.current_package.as_deref() {
        lines.push(format!("Current package: {}", current));
    }
    for package in status.packages.as_deref().unwrap_or_default() {
        lines.push(format!(
            "- {}. {} [{}] {} files",
            package.order,
            or_dash(package.name.as_deref()),
            or_dash(package.status.as_deref()),
            package.file_count
        ));
    }
    if let Some(error) = status.error_message.as_deref() {
        lines.push(format!("Error: {}", error));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PackageDto;
    use crate::normalizer::{
        AnalysisSummary, DomainRelationship, IdentifiedDomain, Question, RecommendedMicroservicesCount,
        RoundMetadata,
    };

    fn domain_result() -> DomainAnalysisResult {
        DomainAnalysisResult {
            analysis_summary: Some(AnalysisSummary {
                total_domains_identified: 2,
                confidence_score: 0.9,
                ..Default::default()
            }),
            identified_domains: vec![IdentifiedDomain {
                domain_name: Some("Orders".into()),
                probable_entities: vec!["Order".into(), "LineItem".into()],
                confidence: 0.8,
                estimated_entities: 4,
                ..Default::default()
            }],
            domain_relationships: vec![DomainRelationship {
                from_domain: Some("Orders".into()),
                to_domain: Some("Catalog".into()),
                relationship_type: Some("upstream".into()),
                ..Default::default()
            }],
            recommended_microservices_count: Some(RecommendedMicroservicesCount {
                minimum: 2,
                optimal: 3,
                maximum: 5,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_domain_analysis_sections() {
        let text = render_domain_analysis(&domain_result());

        assert!(text.starts_with("Summary:\n- Domains identified: 2"));
        assert!(text.contains("- Orders (80% confidence, ~4 entities)"));
        assert!(text.contains("  Entities: Order, LineItem"));
        assert!(text.contains("- Orders -> Catalog [upstream, -]"));
        assert!(text.contains("- 3 optimal (min 2, max 5)"));
        assert!(!text.contains("Compliance:"));
    }

    #[test]
    fn test_empty_domain_analysis() {
        let text = render_domain_analysis(&DomainAnalysisResult::default());
        assert!(text.contains("- No summary available."));
        assert!(text.contains("- None identified."));
    }

    #[test]
    fn test_round_analysis_lists_questions() {
        let analysis = RoundAnalysis {
            round_metadata: RoundMetadata {
                round_number: 2,
                confidence_score_before: 0.5,
                confidence_score_after_expected: 0.7,
                requires_another_round: true,
                reasoning: Some("Payments unclear".into()),
                ..Default::default()
            },
            questions: vec![Question {
                question_id: 1,
                question: Some("Which payment providers?".into()),
                priority: Some("high".into()),
                ..Default::default()
            }],
            ..Default::default()
        };

        let text = render_round_analysis(&analysis);
        assert!(text.contains("Confidence: 50% (expected 70%)"));
        assert!(text.contains("Reasoning: Payments unclear"));
        assert!(text.contains("Next questions:\n- [high] Which payment providers?"));
    }

    #[test]
    fn test_transcript_expands_analysis() {
        let messages = vec![
            ChatMessage::system("Round 2"),
            ChatMessage::ai("Where are your users?"),
            ChatMessage::user("EU"),
            ChatMessage::ai("Confidence score: 70%").with_analysis(RoundAnalysis::default()),
        ];

        let collapsed = render_transcript(&messages, false);
        assert_eq!(
            collapsed,
            "== Round 2 ==\nAI: Where are your users?\nYou: EU\nAI: Confidence score: 70%"
        );

        let expanded = render_transcript(&messages, true);
        assert!(expanded.contains("\n    Round 0\n"));
    }

    #[test]
    fn test_generation_status() {
        let status = GenerationStatusResponse {
            current_phase: Some("generating_packages".into()),
            progress: 40.0,
            current_package: Some("orders-service".into()),
            packages: Some(vec![PackageDto {
                order: 1,
                name: Some("orders-service".into()),
                status: Some("done".into()),
                file_count: 12,
                ..Default::default()
            }]),
            error_message: None,
        };

        assert_eq!(
            render_generation_status(&status),
            "Phase: generating_packages (40%)\nCurrent package: orders-service\n- 1. orders-service [done] 12 files"
        );
    }
}
