use super::keys::QuestionSources;
use super::types::{ChatMessage, RoundProgress};
use crate::api::FoundationQuestion;
use crate::normalizer::{Question, RoundAnalysis, RoundRecord};

pub fn round_header(round_number: i64, foundation: bool) -> String {
    if foundation {
        "Foundation questions".to_string()
    } else {
        format!("Round {}", round_number)
    }
}

pub fn analysis_summary(analysis: &RoundAnalysis) -> String {
    let mut summary = format!(
        "Confidence score: {:.0}%",
        analysis.confidence() * 100.0
    );
    if let Some(reasoning) = analysis
        .round_metadata
        .reasoning
        .as_deref()
        .filter(|r| !r.trim().is_empty())
    {
        summary.push('\n');
        summary.push_str(reasoning);
    }
    summary
}

/// Whether a stored round holds foundation answers rather than follow-ups.
pub fn is_foundation_round(record: &RoundRecord, position: usize) -> bool {
    if let Some(kind) = record.round_type.as_deref() {
        let kind = kind.trim().to_ascii_lowercase();
        if kind == "foundation" || kind == "core" {
            return true;
        }
        if kind.starts_with("follow") {
            return false;
        }
    }
    record.round_number == 0
        || (position == 0 && !record.answers().iter().any(|a| a.key.starts_with("FQ")))
}

/// Chat history for every complete round, oldest first.
///
/// Each complete round yields a header, one question per stored answer, the
/// answer itself when non-empty, and a summary carrying the parsed analysis.
pub fn rebuild_transcript(
    rounds: &[RoundRecord],
    foundation: &[FoundationQuestion],
) -> Vec<ChatMessage> {
    let mut ordered: Vec<(usize, &RoundRecord)> = rounds.iter().enumerate().collect();
    ordered.sort_by_key(|(_, r)| r.round_number);

    let mut messages = Vec::new();
    let mut previous: Vec<Question> = Vec::new();

    for (position, record) in ordered {
        let analysis = record.analysis();
        if record.is_complete() {
            messages.push(ChatMessage::system(round_header(
                record.round_number,
                is_foundation_round(record, position),
            )));

            let sources = QuestionSources::new(foundation, &previous);
            for entry in record.answers() {
                messages.push(ChatMessage::ai(sources.resolve(&entry.key)));
                if entry.is_answered() {
                    messages.push(ChatMessage::user(entry.value.as_str()));
                }
            }

            messages.push(match &analysis {
                Some(analysis) => {
                    ChatMessage::ai(analysis_summary(analysis)).with_analysis(analysis.clone())
                }
                None => ChatMessage::ai("Analysis unavailable for this round."),
            });
        }
        previous = analysis.map(|a| a.questions).unwrap_or_default();
    }

    messages
}

/// Replay the answers already given in the round being resumed.
pub fn replay_progress(progress: &RoundProgress, foundation: bool) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(round_header(
        progress.round_number,
        foundation,
    ))];
    for prompt in progress.prompts.iter().filter(|p| p.is_answered()) {
        messages.push(ChatMessage::ai(prompt.text.clone()));
        messages.push(ChatMessage::user(prompt.answer.trim()));
    }
    messages
}
