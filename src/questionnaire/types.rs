use crate::api::{ConversationSession, Notice};
use crate::normalizer::{DomainAnalysisResult, RoundAnalysis};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    System,
    Ai,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MessageMetadata {
    RoundAnalysis(Box<RoundAnalysis>),
    DomainAnalysis(Box<DomainAnalysisResult>),
}

/// One transcript line. Rebuilt from rounds, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<MessageMetadata>,
}

impl ChatMessage {
    fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageKind::System, content)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(MessageKind::Ai, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageKind::User, content)
    }

    pub fn with_analysis(mut self, analysis: RoundAnalysis) -> Self {
        self.metadata = Some(MessageMetadata::RoundAnalysis(Box::new(analysis)));
        self
    }

    pub fn analysis(&self) -> Option<&RoundAnalysis> {
        match &self.metadata {
            Some(MessageMetadata::RoundAnalysis(analysis)) => Some(analysis),
            _ => None,
        }
    }
}

/// A question waiting for (or holding) an answer in the active round.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuestionPrompt {
    /// Key the answer is submitted under: `Q<id>`, `FQ<id>` or literal text.
    pub key: String,
    pub question_id: Option<i64>,
    pub text: String,
    pub hint: Option<String>,
    pub placeholder: Option<String>,
    pub answer: String,
}

impl QuestionPrompt {
    pub fn is_answered(&self) -> bool {
        !self.answer.trim().is_empty()
    }
}

/// The round currently being answered.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoundProgress {
    pub round_number: i64,
    pub round_id: Option<i64>,
    pub prompts: Vec<QuestionPrompt>,
    pub current: usize,
}

impl RoundProgress {
    pub fn current_prompt(&self) -> Option<&QuestionPrompt> {
        self.prompts.get(self.current)
    }

    pub fn answered_count(&self) -> usize {
        self.prompts.iter().filter(|p| p.is_answered()).count()
    }

    pub fn first_unanswered(&self) -> Option<&QuestionPrompt> {
        self.prompts.iter().find(|p| !p.is_answered())
    }

    /// Answers keyed for submission, in question order.
    pub fn answers_map(&self) -> serde_json::Map<String, serde_json::Value> {
        self.prompts
            .iter()
            .map(|p| (p.key.clone(), serde_json::Value::String(p.answer.trim().to_string())))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResumeState {
    Foundation(RoundProgress),
    Followup(RoundProgress),
    DomainApproval { analysis: Option<RoundAnalysis> },
    /// Handed off to the status view.
    Generating,
    Failed { analysis: Option<RoundAnalysis> },
}

impl ResumeState {
    pub fn label(&self) -> String {
        match self {
            ResumeState::Foundation(_) => "foundation".to_string(),
            ResumeState::Followup(progress) => format!("followup({})", progress.round_number),
            ResumeState::DomainApproval { .. } => "domain_approval".to_string(),
            ResumeState::Generating => "generating".to_string(),
            ResumeState::Failed { .. } => "failed".to_string(),
        }
    }

    pub fn progress(&self) -> Option<&RoundProgress> {
        match self {
            ResumeState::Foundation(progress) | ResumeState::Followup(progress) => Some(progress),
            _ => None,
        }
    }

    pub fn progress_mut(&mut self) -> Option<&mut RoundProgress> {
        match self {
            ResumeState::Foundation(progress) | ResumeState::Followup(progress) => Some(progress),
            _ => None,
        }
    }

    pub fn analysis(&self) -> Option<&RoundAnalysis> {
        match self {
            ResumeState::DomainApproval { analysis } | ResumeState::Failed { analysis } => {
                analysis.as_ref()
            }
            _ => None,
        }
    }
}

/// Where a returning user lands and what they see on arrival.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumePlan {
    pub session: ConversationSession,
    pub state: ResumeState,
    pub transcript: Vec<ChatMessage>,
    pub notice: Option<Notice>,
    pub started_new_draft: bool,
}
