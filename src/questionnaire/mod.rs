//! Round-based questionnaire: resuming a session into the right phase,
//! rebuilding its chat history, and answering the active round.

pub mod cache;
pub mod keys;
pub mod resume;
pub mod runner;
pub mod transcript;
pub mod types;

pub use cache::FoundationQuestionCache;
pub use keys::{AnswerKey, QuestionSources};
pub use resume::{plan_resume, ResumeDecision, ResumeInput, ResumeService};
pub use runner::QuestionnaireRunner;
pub use transcript::rebuild_transcript;
pub use types::*;
