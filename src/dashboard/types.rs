use crate::api::ConversationSession;
use crate::normalizer::{DomainAnalysisResult, RoundAnalysis};
use serde::Serialize;

pub const COMPLETED_STATUS: &str = "completed";
pub const IN_ANALYSIS_STATUS: &str = "In analyze";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionLists {
    pub completed: Vec<ConversationSession>,
    pub in_analysis: Vec<ConversationSession>,
}

impl SessionLists {
    /// Case-insensitive project name search; a blank query keeps everything.
    pub fn filter(&self, query: &str) -> SessionLists {
        let query = query.trim().to_lowercase();
        let matches = |session: &&ConversationSession| {
            query.is_empty()
                || session
                    .project_name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&query))
        };
        SessionLists {
            completed: self.completed.iter().filter(matches).cloned().collect(),
            in_analysis: self.in_analysis.iter().filter(matches).cloned().collect(),
        }
    }

    pub fn remove(&mut self, session_id: i64) {
        self.completed.retain(|s| s.session_id != session_id);
        self.in_analysis.retain(|s| s.session_id != session_id);
    }

    pub fn find(&self, session_id: i64) -> Option<&ConversationSession> {
        self.completed
            .iter()
            .chain(self.in_analysis.iter())
            .find(|s| s.session_id == session_id)
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.in_analysis.is_empty()
    }
}

/// Latest analysis of a project, for the analysis dialog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisView {
    pub project_name: String,
    pub analysis: Option<RoundAnalysis>,
    pub domain_analysis: Option<DomainAnalysisResult>,
}
