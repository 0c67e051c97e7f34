use super::types::{AnalysisView, SessionLists, COMPLETED_STATUS, IN_ANALYSIS_STATUS};
use crate::api::{ApiClient, ApiError, ConversationSession, StartSessionRequest, ValidationError};
use crate::generation::GenerationMonitor;
use crate::normalizer::normalize_rounds;
use crate::questionnaire::resume::foundation_progress;
use crate::questionnaire::{FoundationQuestionCache, ResumePlan, ResumeService, ResumeState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Project list actions: listing, creating, continuing, deleting and
/// inspecting sessions.
pub struct Dashboard {
    api: Arc<ApiClient>,
    cache: FoundationQuestionCache,
    resume: ResumeService,
    min_credits: i64,
}

impl Dashboard {
    pub fn new(
        api: Arc<ApiClient>,
        cache: FoundationQuestionCache,
        approval_threshold: f64,
        min_credits: i64,
    ) -> Self {
        let resume = ResumeService::new(api.clone(), cache.clone(), approval_threshold);
        Self {
            api,
            cache,
            resume,
            min_credits,
        }
    }

    /// Completed and in-progress sessions, fetched concurrently.
    pub async fn load_sessions(&self) -> Result<SessionLists, ApiError> {
        let (completed, in_analysis) = tokio::try_join!(
            self.api.get_sessions_by_status(COMPLETED_STATUS),
            self.api.get_sessions_by_status(IN_ANALYSIS_STATUS),
        )?;
        debug!(
            "Loaded {} completed and {} in-progress sessions",
            completed.len(),
            in_analysis.len()
        );
        Ok(SessionLists {
            completed,
            in_analysis,
        })
    }

    /// Current balance, failing when it does not exceed the minimum.
    pub async fn ensure_credits(&self) -> Result<i64, ApiError> {
        let balance = self.api.get_credit_balance().await?.credits_balance;
        if balance > self.min_credits {
            Ok(balance)
        } else {
            Err(ApiError::InsufficientCredits { balance })
        }
    }

    pub async fn create_project(
        &self,
        user_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<ResumePlan, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::missing("project name").into());
        }
        self.ensure_credits().await?;

        let response = self
            .api
            .start_session(&StartSessionRequest {
                user_id,
                project_name: Some(name.to_string()),
                project_description: description
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
            })
            .await?;
        self.cache
            .cache(response.session.session_id, &response.foundation_questions);
        info!("Created project {} ({})", response.session.session_id, name);

        Ok(ResumePlan {
            state: ResumeState::Foundation(foundation_progress(&response.foundation_questions)),
            session: response.session,
            transcript: Vec::new(),
            notice: None,
            started_new_draft: false,
        })
    }

    pub async fn continue_project(&self, session_id: i64, user_id: i64) -> Result<ResumePlan, ApiError> {
        self.ensure_credits().await?;
        self.resume.resume(session_id, user_id).await
    }

    pub async fn delete_project(&self, session_id: i64) -> Result<(), ApiError> {
        self.api.delete_session(session_id).await?;
        self.cache.clear(session_id);
        info!("Deleted project {}", session_id);
        Ok(())
    }

    /// Newest round that carries an analysis, parsed for display.
    pub async fn view_analysis(&self, session: &ConversationSession) -> Result<AnalysisView, ApiError> {
        let metadata = self.api.get_session_metadata(session.session_id).await?;
        let rounds = normalize_rounds(metadata.rounds.as_deref().unwrap_or_default());
        let analysis = rounds.iter().rev().find_map(|r| r.analysis());

        Ok(AnalysisView {
            project_name: session
                .project_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Project".to_string()),
            domain_analysis: analysis.as_ref().and_then(|a| a.last_analysis_data.clone()),
            analysis,
        })
    }

    pub async fn download_project(
        &self,
        session_id: i64,
        dir: &Path,
    ) -> Result<PathBuf, ApiError> {
        self.ensure_credits().await?;
        GenerationMonitor::new(self.api.clone(), Duration::ZERO)
            .download_package(session_id, dir)
            .await
    }
}
