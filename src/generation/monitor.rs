use crate::api::{ApiClient, ApiError, GenerationStatusResponse, SessionPhase};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum WatchOutcome {
    Completed(GenerationStatusResponse),
    Failed(GenerationStatusResponse),
    Cancelled,
}

pub fn package_file_name(session_id: i64) -> String {
    format!("project-{}.zip", session_id)
}

/// Follows package generation for a session and fetches the result.
pub struct GenerationMonitor {
    api: Arc<ApiClient>,
    poll_interval: Duration,
}

impl GenerationMonitor {
    pub fn new(api: Arc<ApiClient>, poll_interval: Duration) -> Self {
        Self { api, poll_interval }
    }

    pub async fn fetch_status(&self, session_id: i64) -> Result<GenerationStatusResponse, ApiError> {
        self.api.get_session_status(session_id).await
    }

    /// Poll until generation completes or fails, or `cancel` fires.
    ///
    /// Transient errors are logged and polling continues; a rejected token
    /// ends the watch since every later poll would fail the same way.
    pub async fn watch<F>(
        &self,
        session_id: i64,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> Result<WatchOutcome, ApiError>
    where
        F: FnMut(&GenerationStatusResponse),
    {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Stopped watching session {}", session_id);
                    return Ok(WatchOutcome::Cancelled);
                }
                _ = interval.tick() => {}
            }

            match self.fetch_status(session_id).await {
                Ok(status) => {
                    on_update(&status);
                    match status.phase() {
                        SessionPhase::Completed => {
                            info!("Generation completed for session {}", session_id);
                            return Ok(WatchOutcome::Completed(status));
                        }
                        SessionPhase::Failed => {
                            warn!(
                                "Generation failed for session {}: {}",
                                session_id,
                                status.error_message.as_deref().unwrap_or("unknown error")
                            );
                            return Ok(WatchOutcome::Failed(status));
                        }
                        _ => {}
                    }
                }
                Err(e) if e.status() == Some(401) => return Err(e),
                Err(e) => warn!("Failed to fetch status for session {}: {}", session_id, e),
            }
        }
    }

    /// Download the generated package into `dir` as `project-<id>.zip`.
    pub async fn download_package(&self, session_id: i64, dir: &Path) -> Result<PathBuf, ApiError> {
        let bytes = self.api.download_project(session_id).await?;
        tokio::fs::create_dir_all(dir).await?;
        let target = dir.join(package_file_name(session_id));
        tokio::fs::write(&target, &bytes).await?;
        info!("Saved {} bytes to {}", bytes.len(), target.display());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::fixtures::client_for;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn status(phase: &str, progress: f64) -> serde_json::Value {
        json!({
            "currentPhase": phase,
            "progress": progress,
            "currentPackage": "Catalog service",
            "packages": [{"packageId": 1, "name": "Catalog service", "status": "in_progress"}]
        })
    }

    fn monitor(server: &MockServer) -> GenerationMonitor {
        GenerationMonitor::new(client_for(server).api, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_watch_until_completed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversation/5/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status("generating_packages", 40.0)))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/conversation/5/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status("completed", 100.0)))
            .mount(&server)
            .await;

        let mut seen = Vec::new();
        let outcome = monitor(&server)
            .watch(5, &CancellationToken::new(), |s| seen.push(s.progress))
            .await
            .unwrap();

        assert!(matches!(outcome, WatchOutcome::Completed(_)));
        assert_eq!(seen, vec![40.0, 40.0, 100.0]);
    }

    #[tokio::test]
    async fn test_watch_reports_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversation/5/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "currentPhase": "failed",
                "errorMessage": "Template rendering failed"
            })))
            .mount(&server)
            .await;

        let outcome = monitor(&server)
            .watch(5, &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        match outcome {
            WatchOutcome::Failed(status) => {
                assert_eq!(status.error_message.as_deref(), Some("Template rendering failed"))
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_watch_survives_transient_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversation/5/status"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/conversation/5/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status("completed", 100.0)))
            .mount(&server)
            .await;

        let outcome = monitor(&server)
            .watch(5, &CancellationToken::new(), |_| {})
            .await
            .unwrap();
        assert!(matches!(outcome, WatchOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn test_watch_can_be_cancelled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversation/5/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status("queued", 0.0)))
            .mount(&server)
            .await;

        let token = CancellationToken::new();
        let canceller = token.clone();
        let outcome = monitor(&server)
            .watch(5, &token, move |_| canceller.cancel())
            .await
            .unwrap();

        assert_eq!(outcome, WatchOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_download_writes_zip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/system/download/session/9"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04zip".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let target = monitor(&server)
            .download_package(9, &dir.path().join("out"))
            .await
            .unwrap();

        assert_eq!(target.file_name().unwrap(), "project-9.zip");
        assert_eq!(std::fs::read(&target).unwrap(), b"PK\x03\x04zip".to_vec());
    }
}
