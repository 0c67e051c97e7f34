use super::cache::FoundationQuestionCache;
use super::keys::{followup_prompts, foundation_prompts, match_prompt, AnswerKey, QuestionSources};
use super::transcript::{is_foundation_round, rebuild_transcript, replay_progress};
use super::types::{ChatMessage, QuestionPrompt, ResumePlan, ResumeState, RoundProgress};
use crate::api::{
    ApiClient, ApiError, ConversationSession, FoundationQuestion, Notice, SessionPhase,
    StartSessionRequest,
};
use crate::normalizer::{normalize_rounds, Question, RoundAnalysis, RoundRecord};
use std::sync::Arc;
use tracing::{debug, info};

pub const NEW_DRAFT_TITLE: &str = "Started a new draft";
pub const NEW_DRAFT_DESCRIPTION: &str =
    "We couldn't restore the original draft questions, so we started a new session.";

/// Everything the resume decision looks at, already fetched and normalized.
pub struct ResumeInput<'a> {
    pub session: &'a ConversationSession,
    /// Normalized rounds, ascending by round number.
    pub rounds: &'a [RoundRecord],
    pub cached_foundation: Option<&'a [FoundationQuestion]>,
    pub approval_threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResumeDecision {
    Ready(ResumePlan),
    /// Nothing to resume from; a fresh session has to be started.
    StartNewDraft {
        project_name: String,
        project_description: Option<String>,
    },
}

fn last_analysis(rounds: &[RoundRecord]) -> Option<RoundAnalysis> {
    rounds.iter().rev().find_map(|r| r.analysis())
}

fn plan(
    session: &ConversationSession,
    state: ResumeState,
    transcript: Vec<ChatMessage>,
) -> ResumeDecision {
    ResumeDecision::Ready(ResumePlan {
        session: session.clone(),
        state,
        transcript,
        notice: None,
        started_new_draft: false,
    })
}

/// First prompt still waiting for an answer; the last one when all are filled.
fn current_index(prompts: &[QuestionPrompt]) -> usize {
    prompts
        .iter()
        .position(|p| !p.is_answered())
        .unwrap_or_else(|| prompts.len().saturating_sub(1))
}

/// Progress for a round that has answers stored but no analysis yet.
fn incomplete_progress(
    record: &RoundRecord,
    foundation_round: bool,
    foundation: &[FoundationQuestion],
    previous: &[Question],
) -> RoundProgress {
    let sources = QuestionSources::new(foundation, previous);
    let mut prompts = if foundation_round {
        sources.foundation_prompts()
    } else {
        sources.followup_prompts()
    };

    for entry in record.answers() {
        match match_prompt(&prompts, &entry.key) {
            Some(index) => prompts[index].answer = entry.value.clone(),
            None => prompts.push(QuestionPrompt {
                key: entry.key.clone(),
                question_id: AnswerKey::parse(&entry.key).id(),
                text: sources.resolve(&entry.key),
                answer: entry.value.clone(),
                ..Default::default()
            }),
        }
    }

    let current = current_index(&prompts);
    RoundProgress {
        round_number: record.round_number,
        round_id: record.round_id,
        prompts,
        current,
    }
}

pub fn foundation_progress(questions: &[FoundationQuestion]) -> RoundProgress {
    RoundProgress {
        round_number: 0,
        round_id: None,
        prompts: foundation_prompts(questions),
        current: 0,
    }
}

pub fn followup_progress(round_number: i64, analysis: &RoundAnalysis) -> RoundProgress {
    RoundProgress {
        round_number,
        round_id: (analysis.round_id > 0).then_some(analysis.round_id),
        prompts: followup_prompts(&analysis.questions),
        current: 0,
    }
}

/// Decide where a returning user resumes. Pure: no I/O.
pub fn plan_resume(input: &ResumeInput<'_>) -> ResumeDecision {
    let session = input.session;
    let rounds = input.rounds;
    let foundation = input.cached_foundation.unwrap_or_default();

    match session.phase() {
        SessionPhase::Generating | SessionPhase::Completed => {
            return plan(session, ResumeState::Generating, Vec::new());
        }
        SessionPhase::Failed => {
            return plan(
                session,
                ResumeState::Failed {
                    analysis: last_analysis(rounds),
                },
                rebuild_transcript(rounds, foundation),
            );
        }
        SessionPhase::Foundation | SessionPhase::InAnalysis => {}
    }

    if let Some(position) = rounds.iter().position(|r| !r.is_complete()) {
        let record = &rounds[position];
        let foundation_round = is_foundation_round(record, position);
        let previous = position
            .checked_sub(1)
            .and_then(|i| rounds[i].analysis())
            .map(|a| a.questions)
            .unwrap_or_default();

        let progress = incomplete_progress(record, foundation_round, foundation, &previous);
        debug!(
            "Resuming round {} at question {} of {}",
            progress.round_number,
            progress.current + 1,
            progress.prompts.len()
        );

        let mut transcript = rebuild_transcript(rounds, foundation);
        if progress.answered_count() > 0 {
            transcript.extend(replay_progress(&progress, foundation_round));
        }
        let state = if foundation_round {
            ResumeState::Foundation(progress)
        } else {
            ResumeState::Followup(progress)
        };
        return plan(session, state, transcript);
    }

    let Some(last) = rounds.last() else {
        return match input.cached_foundation.filter(|q| !q.is_empty()) {
            Some(questions) => plan(
                session,
                ResumeState::Foundation(foundation_progress(questions)),
                Vec::new(),
            ),
            None => ResumeDecision::StartNewDraft {
                project_name: session.display_name(),
                project_description: session.project_description.clone(),
            },
        };
    };

    let transcript = rebuild_transcript(rounds, foundation);
    let analysis = last_analysis(rounds);

    if session.confidence() >= input.approval_threshold {
        return plan(session, ResumeState::DomainApproval { analysis }, transcript);
    }

    match analysis {
        Some(analysis) if !analysis.questions.is_empty() => {
            let progress = followup_progress(last.round_number + 1, &analysis);
            plan(session, ResumeState::Followup(progress), transcript)
        }
        // Below threshold but the analysis asked nothing further: offer
        // approval instead of a follow-up round with no prompts.
        analysis => plan(session, ResumeState::DomainApproval { analysis }, transcript),
    }
}

/// Resolves a session into a [`ResumePlan`], starting a new draft when the
/// original foundation questions cannot be recovered.
pub struct ResumeService {
    api: Arc<ApiClient>,
    cache: FoundationQuestionCache,
    approval_threshold: f64,
}

impl ResumeService {
    pub fn new(api: Arc<ApiClient>, cache: FoundationQuestionCache, approval_threshold: f64) -> Self {
        Self {
            api,
            cache,
            approval_threshold,
        }
    }

    pub async fn resume(&self, session_id: i64, user_id: i64) -> Result<ResumePlan, ApiError> {
        let metadata = self.api.get_session_metadata(session_id).await?;
        let rounds = normalize_rounds(metadata.rounds.as_deref().unwrap_or_default());
        let cached = self.cache.get(session_id);

        let decision = plan_resume(&ResumeInput {
            session: &metadata.session,
            rounds: &rounds,
            cached_foundation: cached.as_deref(),
            approval_threshold: self.approval_threshold,
        });

        match decision {
            ResumeDecision::Ready(plan) => {
                info!("Session {} resumes in {}", session_id, plan.state.label());
                Ok(plan)
            }
            ResumeDecision::StartNewDraft {
                project_name,
                project_description,
            } => {
                info!("Session {} has no recoverable draft, starting a new one", session_id);
                let response = self
                    .api
                    .start_session(&StartSessionRequest {
                        user_id,
                        project_name: Some(project_name),
                        project_description,
                    })
                    .await?;
                self.cache
                    .cache(response.session.session_id, &response.foundation_questions);

                Ok(ResumePlan {
                    state: ResumeState::Foundation(foundation_progress(
                        &response.foundation_questions,
                    )),
                    session: response.session,
                    transcript: Vec::new(),
                    notice: Some(Notice::info(NEW_DRAFT_TITLE, NEW_DRAFT_DESCRIPTION)),
                    started_new_draft: true,
                })
            }
        }
    }
}
