use super::types::QuestionPrompt;
use crate::api::FoundationQuestion;
use crate::normalizer::Question;

/// How an answer map key refers to its question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKey<'a> {
    /// `Q<n>`: foundation question id.
    Foundation(i64),
    /// `FQ<n>`: follow-up question from the previous round.
    Followup(i64),
    /// Anything else is the question text itself.
    Literal(&'a str),
}

impl<'a> AnswerKey<'a> {
    pub fn parse(key: &'a str) -> Self {
        let trimmed = key.trim();
        if let Some(n) = trimmed.strip_prefix("FQ").and_then(|n| n.parse().ok()) {
            return AnswerKey::Followup(n);
        }
        if let Some(n) = trimmed.strip_prefix('Q').and_then(|n| n.parse().ok()) {
            return AnswerKey::Foundation(n);
        }
        AnswerKey::Literal(key)
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            AnswerKey::Foundation(n) | AnswerKey::Followup(n) => Some(*n),
            AnswerKey::Literal(_) => None,
        }
    }
}

pub fn foundation_key(question_id: i64) -> String {
    format!("Q{}", question_id)
}

pub fn followup_key(question_id: i64) -> String {
    format!("FQ{}", question_id)
}

/// Question lists an answer key can be resolved against.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionSources<'a> {
    pub foundation: &'a [FoundationQuestion],
    /// Follow-up questions of the immediately preceding round.
    pub previous: &'a [Question],
}

impl<'a> QuestionSources<'a> {
    pub fn new(foundation: &'a [FoundationQuestion], previous: &'a [Question]) -> Self {
        Self {
            foundation,
            previous,
        }
    }

    /// `FQ<n>` matches a question id first, then the n-th question.
    fn followup(&self, n: i64) -> Option<&'a Question> {
        self.previous
            .iter()
            .find(|q| q.question_id == n)
            .or_else(|| {
                usize::try_from(n - 1)
                    .ok()
                    .and_then(|index| self.previous.get(index))
            })
    }

    fn foundation(&self, n: i64) -> Option<&'a FoundationQuestion> {
        self.foundation.iter().find(|q| q.question_id == n)
    }

    /// Human-readable question for a key; the raw key when nothing matches.
    pub fn resolve(&self, key: &str) -> String {
        let text = match AnswerKey::parse(key) {
            AnswerKey::Followup(n) => self.followup(n).and_then(|q| q.question.clone()),
            AnswerKey::Foundation(n) => self.foundation(n).and_then(|q| q.question.clone()),
            AnswerKey::Literal(text) => Some(text.to_string()),
        };
        text.filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| key.to_string())
    }

    pub fn foundation_prompts(&self) -> Vec<QuestionPrompt> {
        foundation_prompts(self.foundation)
    }

    pub fn followup_prompts(&self) -> Vec<QuestionPrompt> {
        followup_prompts(self.previous)
    }
}

pub fn foundation_prompts(questions: &[FoundationQuestion]) -> Vec<QuestionPrompt> {
    let mut ordered: Vec<&FoundationQuestion> = questions.iter().collect();
    ordered.sort_by_key(|q| q.question_order);
    ordered
        .into_iter()
        .map(|q| QuestionPrompt {
            key: foundation_key(q.question_id),
            question_id: Some(q.question_id),
            text: q.question.clone().unwrap_or_default(),
            hint: q.help_text.clone(),
            placeholder: q.placeholder.clone(),
            answer: String::new(),
        })
        .collect()
}

pub fn followup_prompts(questions: &[Question]) -> Vec<QuestionPrompt> {
    questions
        .iter()
        .map(|q| QuestionPrompt {
            key: followup_key(q.question_id),
            question_id: Some(q.question_id),
            text: q.question.clone().unwrap_or_default(),
            hint: q.reason.clone(),
            placeholder: q.expected_answer_type.clone(),
            answer: String::new(),
        })
        .collect()
}

/// Index of the prompt a stored answer key belongs to.
pub fn match_prompt(prompts: &[QuestionPrompt], key: &str) -> Option<usize> {
    if let Some(index) = prompts.iter().position(|p| p.key == key) {
        return Some(index);
    }
    match AnswerKey::parse(key) {
        AnswerKey::Followup(n) => prompts
            .iter()
            .position(|p| p.question_id == Some(n) && p.key.starts_with("FQ"))
            .or_else(|| {
                usize::try_from(n - 1)
                    .ok()
                    .filter(|index| *index < prompts.len())
            }),
        AnswerKey::Foundation(n) => prompts
            .iter()
            .position(|p| p.question_id == Some(n) && !p.key.starts_with("FQ")),
        AnswerKey::Literal(text) => prompts.iter().position(|p| p.text == text),
    }
}
