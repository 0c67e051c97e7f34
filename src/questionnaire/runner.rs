use super::resume::followup_progress;
use super::transcript::{analysis_summary, round_header};
use super::types::{ChatMessage, QuestionPrompt, ResumePlan, ResumeState, RoundProgress};
use crate::api::{
    ApiClient, ApiError, FollowupOutcome, Notice, SubmitAnswersRequest, ValidationError,
};
use crate::normalizer::RoundAnalysis;
use std::sync::Arc;
use tracing::{debug, info};

/// Drives live answering of the active round and the transitions that follow
/// a submission or an approval.
pub struct QuestionnaireRunner {
    api: Arc<ApiClient>,
    session_id: i64,
    state: ResumeState,
    transcript: Vec<ChatMessage>,
    last_analysis: Option<RoundAnalysis>,
}

impl QuestionnaireRunner {
    pub fn new(api: Arc<ApiClient>, session_id: i64, state: ResumeState) -> Self {
        let last_analysis = state.analysis().cloned();
        Self {
            api,
            session_id,
            state,
            transcript: Vec::new(),
            last_analysis,
        }
    }

    pub fn from_plan(api: Arc<ApiClient>, plan: ResumePlan) -> Self {
        let last_analysis = plan
            .state
            .analysis()
            .cloned()
            .or_else(|| plan.transcript.iter().rev().find_map(|m| m.analysis().cloned()));
        Self {
            api,
            session_id: plan.session.session_id,
            state: plan.state,
            transcript: plan.transcript,
            last_analysis,
        }
    }

    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    pub fn state(&self) -> &ResumeState {
        &self.state
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn last_analysis(&self) -> Option<&RoundAnalysis> {
        self.last_analysis.as_ref()
    }

    pub fn current_question(&self) -> Option<&QuestionPrompt> {
        self.state.progress().and_then(RoundProgress::current_prompt)
    }

    /// Record an answer for the current question.
    pub fn answer(&mut self, text: &str) -> bool {
        match self.state.progress_mut() {
            Some(progress) => match progress.prompts.get_mut(progress.current) {
                Some(prompt) => {
                    prompt.answer = text.to_string();
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    pub fn can_proceed(&self) -> bool {
        self.current_question().is_some_and(QuestionPrompt::is_answered)
    }

    pub fn is_last_question(&self) -> bool {
        self.state
            .progress()
            .is_some_and(|p| p.current + 1 >= p.prompts.len())
    }

    /// Move to the next question once the current one is answered.
    pub fn next(&mut self) -> bool {
        if !self.can_proceed() || self.is_last_question() {
            return false;
        }
        match self.state.progress_mut() {
            Some(progress) => {
                progress.current += 1;
                true
            }
            None => false,
        }
    }

    pub fn previous(&mut self) -> bool {
        match self.state.progress_mut() {
            Some(progress) if progress.current > 0 => {
                progress.current -= 1;
                true
            }
            _ => false,
        }
    }

    /// Warns when the active round still has blank answers. Answers live
    /// only in this runner until the round is submitted.
    pub fn unsubmitted_notice(&self) -> Option<Notice> {
        let progress = self.state.progress()?;
        let remaining = progress.prompts.len() - progress.answered_count();
        if remaining == 0 {
            return None;
        }
        Some(Notice::info(
            "Answers not submitted",
            &format!(
                "{} question(s) still need an answer. Pass every remaining answer in one call; partial answers are not saved.",
                remaining
            ),
        ))
    }

    fn validated_progress(&self) -> Result<RoundProgress, ApiError> {
        let progress = self.state.progress().ok_or_else(|| {
            ApiError::InvalidState(format!("nothing to submit in {}", self.state.label()))
        })?;
        if progress.prompts.is_empty() {
            return Err(ValidationError::missing("answers").into());
        }
        if let Some(blank) = progress.first_unanswered() {
            return Err(ValidationError::missing(blank.key.clone()).into());
        }
        Ok(progress.clone())
    }

    fn record_round(
        &mut self,
        progress: &RoundProgress,
        foundation: bool,
        analysis: Option<&RoundAnalysis>,
    ) {
        self.transcript
            .push(ChatMessage::system(round_header(progress.round_number, foundation)));
        for prompt in &progress.prompts {
            self.transcript.push(ChatMessage::ai(prompt.text.clone()));
            self.transcript.push(ChatMessage::user(prompt.answer.trim()));
        }
        if let Some(analysis) = analysis {
            self.transcript
                .push(ChatMessage::ai(analysis_summary(analysis)).with_analysis(analysis.clone()));
        }
    }

    fn next_round_number(current: i64, analysis: &RoundAnalysis) -> i64 {
        if analysis.round_number > current {
            analysis.round_number
        } else {
            current + 1
        }
    }

    fn after_analysis(&mut self, current_round: i64, analysis: RoundAnalysis) {
        self.state = if analysis.questions.is_empty() {
            ResumeState::DomainApproval {
                analysis: Some(analysis.clone()),
            }
        } else {
            let next = Self::next_round_number(current_round, &analysis);
            ResumeState::Followup(followup_progress(next, &analysis))
        };
        self.last_analysis = Some(analysis);
    }

    /// Submit every answer of the active round. Blank answers are rejected
    /// before any request is made.
    pub async fn submit(&mut self) -> Result<&ResumeState, ApiError> {
        let progress = self.validated_progress()?;
        let request = SubmitAnswersRequest {
            answers: progress.answers_map(),
            round_id: progress.round_id,
        };

        if matches!(self.state, ResumeState::Foundation(_)) {
            debug!("Submitting {} foundation answers", progress.prompts.len());
            let analysis = self
                .api
                .submit_core_answers(self.session_id, &request)
                .await?;
            self.record_round(&progress, true, Some(&analysis));
            self.after_analysis(progress.round_number, analysis);
        } else {
            debug!(
                "Submitting {} answers for round {}",
                progress.prompts.len(),
                progress.round_number
            );
            let outcome = self
                .api
                .submit_followup_answers(self.session_id, progress.round_number, &request)
                .await?;
            match outcome {
                FollowupOutcome::GenerationStarted => {
                    self.record_round(&progress, false, None);
                    self.state = ResumeState::Generating;
                }
                FollowupOutcome::Analyzed(analysis) if !analysis.requires_another_round() => {
                    self.record_round(&progress, false, Some(&analysis));
                    self.last_analysis = Some(analysis);
                    self.state = ResumeState::Generating;
                }
                FollowupOutcome::Analyzed(analysis) => {
                    self.record_round(&progress, false, Some(&analysis));
                    self.after_analysis(progress.round_number, analysis);
                }
            }
        }

        info!("Session {} moved to {}", self.session_id, self.state.label());
        Ok(&self.state)
    }

    /// Confirm the domain model and start generation. Also the retry path
    /// after a failed generation.
    pub async fn approve(&mut self) -> Result<&ResumeState, ApiError> {
        if !matches!(
            self.state,
            ResumeState::DomainApproval { .. } | ResumeState::Failed { .. }
        ) {
            return Err(ApiError::InvalidState(format!(
                "cannot approve in {}",
                self.state.label()
            )));
        }
        self.api.approve_domain(self.session_id).await?;
        self.state = ResumeState::Generating;
        info!("Session {} approved, generation started", self.session_id);
        Ok(&self.state)
    }
}
