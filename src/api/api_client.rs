use super::error::ApiError;
use super::types::*;
use crate::auth::CredentialStore;
use crate::normalizer::{normalize_analysis, RoundAnalysis};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const REFRESH_ENDPOINT: &str = "/Token/refresh";

/// Result of submitting a follow-up round.
#[derive(Debug, Clone, PartialEq)]
pub enum FollowupOutcome {
    /// The round was scored; more questions may follow.
    Analyzed(RoundAnalysis),
    /// 202 with no body: the backend went straight to generation.
    GenerationStarted,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: CredentialStore,
    // Serialises refreshes so concurrent 401s share one refresh call.
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    pub fn new(base_url: &str, credentials: CredentialStore) -> Result<Self, ApiError> {
        // The refresh token is an HttpOnly cookie; keep a jar so it is replayed.
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn send(
        &self,
        method: &Method,
        endpoint: &str,
        body: Option<&[u8]>,
        json_content: bool,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let mut request = self.client.request(method.clone(), self.url(endpoint));
        if json_content {
            request = request.header(CONTENT_TYPE, "application/json");
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.body(body.to_vec());
        }
        Ok(request.send().await?)
    }

    /// Issue a request with token injection, proactive refresh and a single
    /// refresh-and-retry on 401.
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Vec<u8>>,
        json_content: bool,
    ) -> Result<Response, ApiError> {
        if !self.credentials.is_authenticated() {
            if let Err(e) = self.credentials.load() {
                warn!("Failed to load stored credentials: {}", e);
            }
        }

        if self.credentials.is_expired() {
            let stale = self.credentials.access_token();
            self.refresh_access_token(stale.as_deref()).await;
        }

        let token = self.credentials.access_token();
        debug!("{} {}", method, endpoint);
        let response = self
            .send(&method, endpoint, body.as_deref(), json_content, token.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if self.refresh_access_token(token.as_deref()).await {
                let token = self.credentials.access_token();
                debug!("Retrying {} {} after refresh", method, endpoint);
                let retry = self
                    .send(&method, endpoint, body.as_deref(), json_content, token.as_deref())
                    .await?;
                if !retry.status().is_success() {
                    return Err(Self::error_from_response(retry).await);
                }
                return Ok(retry);
            }
            return Err(Self::error_from_response(response).await);
        }

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(response)
    }

    /// Refresh through the HttpOnly cookie. Returns whether a usable token is
    /// now held. `stale` is the token the caller saw; if another task already
    /// replaced it, that token is reused instead of refreshing again.
    async fn refresh_access_token(&self, stale: Option<&str>) -> bool {
        let _guard = self.refresh_lock.lock().await;

        let current = self.credentials.access_token();
        if current.is_some() && current.as_deref() != stale && !self.credentials.is_expired() {
            debug!("Token already refreshed by a concurrent request");
            return true;
        }

        match self.post_refresh().await {
            Ok(Some(jwt)) => {
                if let Some(token) = jwt.access_token.as_deref() {
                    match self.credentials.set(token, jwt.expires_at()) {
                        Ok(()) => return true,
                        Err(e) => warn!("Failed to store refreshed token: {}", e),
                    }
                }
            }
            Ok(None) => warn!("Token refresh returned no access token"),
            Err(e) => warn!("Token refresh failed: {}", e),
        }

        if let Err(e) = self.credentials.clear() {
            warn!("Failed to clear credentials: {}", e);
        }
        false
    }

    async fn post_refresh(&self) -> Result<Option<JwtResponse>, ApiError> {
        let response = self
            .send(&Method::POST, REFRESH_ENDPOINT, None, true, None)
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status().as_u16(),
            });
        }
        let result: StrategyResult<JwtResponse> = response.json().await?;
        Ok(result.data.filter(|jwt| jwt.access_token.is_some()))
    }

    async fn error_from_response(response: Response) -> ApiError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ProblemDetails>(&text) {
            Ok(mut problem) if problem.title.is_some() || problem.detail.is_some() => {
                problem.status = problem.status.or(Some(status));
                ApiError::Problem { status, problem }
            }
            _ => ApiError::Status { status },
        }
    }

    fn encode_body<B: Serialize>(body: Option<&B>) -> Result<Option<Vec<u8>>, ApiError> {
        body.map(|b| serde_json::to_vec(b).map_err(|e| ApiError::Parse(e.to_string())))
            .transpose()
    }

    /// JSON request. 204, and any empty body (including 202), yield `None`.
    async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let response = self
            .execute(method, endpoint, Self::encode_body(body)?, true)
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ApiError::Parse(format!("{} ({})", e, endpoint)))
    }

    async fn request_required<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        self.request(method, endpoint, body)
            .await?
            .ok_or_else(|| ApiError::EmptyResponse {
                endpoint: endpoint.to_string(),
            })
    }

    async fn request_empty<B: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        self.execute(method, endpoint, Self::encode_body(body)?, true)
            .await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request_required::<T, ()>(Method::GET, endpoint, None)
            .await
    }

    /// Raw bytes with the same token/refresh/retry handling.
    async fn request_bytes(&self, endpoint: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.execute(Method::GET, endpoint, None, false).await?;
        Ok(response.bytes().await?.to_vec())
    }

    fn analysis_from(value: serde_json::Value, endpoint: &str) -> Result<RoundAnalysis, ApiError> {
        normalize_analysis(&value)
            .ok_or_else(|| ApiError::Parse(format!("unexpected analysis payload ({})", endpoint)))
    }

    // Auth

    pub fn login_url(&self) -> String {
        self.url("/GoogleLogin/login")
    }

    pub async fn create_token(&self, user_id: i64) -> Result<StrategyResult<JwtResponse>, ApiError> {
        let body = JwtRequest {
            user_id: Some(user_id),
        };
        self.request_required(Method::POST, "/Token/create", Some(&body))
            .await
    }

    // Conversation

    pub async fn get_credit_balance(&self) -> Result<UserCreditsEntity, ApiError> {
        self.get("/conversation/credit/balance").await
    }

    pub async fn start_session(
        &self,
        request: &StartSessionRequest,
    ) -> Result<StartSessionResponse, ApiError> {
        self.request_required(Method::POST, "/conversation/start", Some(request))
            .await
    }

    pub async fn submit_core_answers(
        &self,
        session_id: i64,
        request: &SubmitAnswersRequest,
    ) -> Result<RoundAnalysis, ApiError> {
        let endpoint = format!("/conversation/{}/core-answers", session_id);
        let value: serde_json::Value = self
            .request_required(Method::POST, &endpoint, Some(request))
            .await?;
        Self::analysis_from(value, &endpoint)
    }

    pub async fn submit_followup_answers(
        &self,
        session_id: i64,
        round_number: i64,
        request: &SubmitAnswersRequest,
    ) -> Result<FollowupOutcome, ApiError> {
        let endpoint = format!(
            "/conversation/{}/followup-answers/{}",
            session_id, round_number
        );
        let value: Option<serde_json::Value> = self
            .request(Method::POST, &endpoint, Some(request))
            .await?;

        match value {
            Some(value) if value.as_object().is_some_and(|m| !m.is_empty()) => {
                Ok(FollowupOutcome::Analyzed(Self::analysis_from(value, &endpoint)?))
            }
            _ => Ok(FollowupOutcome::GenerationStarted),
        }
    }

    pub async fn approve_domain(&self, session_id: i64) -> Result<(), ApiError> {
        let endpoint = format!("/conversation/{}/approve-domain", session_id);
        self.request_empty::<()>(Method::POST, &endpoint, None)
            .await
    }

    pub async fn get_session_status(
        &self,
        session_id: i64,
    ) -> Result<GenerationStatusResponse, ApiError> {
        self.get(&format!("/conversation/{}/status", session_id))
            .await
    }

    /// Sessions by backend status label, e.g. `completed` or `In analyze`.
    pub async fn get_sessions_by_status(
        &self,
        status: &str,
    ) -> Result<Vec<ConversationSession>, ApiError> {
        let endpoint = format!("/conversation/all/by/{}", status.replace(' ', "%20"));
        Ok(self
            .request::<Vec<ConversationSession>, ()>(Method::GET, &endpoint, None)
            .await?
            .unwrap_or_default())
    }

    pub async fn get_session_metadata(&self, session_id: i64) -> Result<SessionMetadata, ApiError> {
        self.get(&format!("/conversation/metadata/{}", session_id))
            .await
    }

    pub async fn delete_session(&self, session_id: i64) -> Result<(), ApiError> {
        let endpoint = format!("/conversation/delete/{}", session_id);
        self.request_empty::<()>(Method::DELETE, &endpoint, None)
            .await
    }

    // Plans and billing

    pub async fn get_plans(&self) -> Result<Vec<PlanEntity>, ApiError> {
        let result: StrategyResult<OneOrMany<PlanEntity>> = self.get("/Plans/details").await?;
        Ok(if result.has_errors {
            Vec::new()
        } else {
            result.data.map(OneOrMany::into_vec).unwrap_or_default()
        })
    }

    pub async fn get_user_plan(&self, user_id: i64) -> Result<UserSubscriptionEntity, ApiError> {
        self.get(&format!("/Plans/user/plan/{}", user_id)).await
    }

    pub async fn get_credit_packs(&self) -> Result<Vec<CreditPackEntity>, ApiError> {
        let result: StrategyResult<OneOrMany<CreditPackEntity>> =
            self.get("/Plans/creditPacks").await?;
        Ok(if result.has_errors {
            Vec::new()
        } else {
            result.data.map(OneOrMany::into_vec).unwrap_or_default()
        })
    }

    pub async fn subscribe(&self, request: &SubscribeRequest) -> Result<CheckoutSession, ApiError> {
        self.request_required(Method::POST, "/StripeSubscription/subscribe", Some(request))
            .await
    }

    pub async fn cancel_subscription(&self, user_id: i64) -> Result<(), ApiError> {
        let body = CancelSubscriptionRequest { user_id };
        self.request_empty(Method::POST, "/StripeSubscription/cancel", Some(&body))
            .await
    }

    pub async fn buy_credit_pack(
        &self,
        request: &CreditPackRequest,
    ) -> Result<CheckoutSession, ApiError> {
        self.request_required(Method::POST, "/StripeSubscription/buy/pack", Some(request))
            .await
    }

    // Downloads

    pub fn download_url(&self, session_id: i64) -> String {
        self.url(&format!("/system/download/session/{}", session_id))
    }

    pub async fn download_project(&self, session_id: i64) -> Result<Vec<u8>, ApiError> {
        self.request_bytes(&format!("/system/download/session/{}", session_id))
            .await
    }

    // User inputs

    pub async fn submit_contact_sales(&self, request: &UserInputRequest) -> Result<(), ApiError> {
        self.request_empty(Method::POST, "/UserInputs/contact-sales", Some(request))
            .await
    }

    pub async fn submit_feedback(&self, request: &UserInputRequest) -> Result<(), ApiError> {
        self.request_empty(Method::POST, "/UserInputs/feedback", Some(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStorage, LocalStorage, ACCESS_TOKEN_KEY};
    use crate::test_helpers::fixtures::refresh_body;
    use serde_json::json;
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> (ApiClient, CredentialStore, Arc<InMemoryStorage>) {
        let storage = Arc::new(InMemoryStorage::new());
        let creds = CredentialStore::new(storage.clone(), 60);
        let client = ApiClient::new(&server.uri(), creds.clone()).unwrap();
        (client, creds, storage)
    }

    fn far_future() -> String {
        (Utc::now() + Duration::hours(1)).to_rfc3339()
    }

    #[tokio::test]
    async fn test_bearer_token_is_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversation/credit/balance"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"userId": 1, "creditsBalance": 9})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (client, creds, _) = client_for(&server);
        creds.set("tok-1", None).unwrap();

        let balance = client.get_credit_balance().await.unwrap();
        assert_eq!(balance.credits_balance, 9);
    }

    #[tokio::test]
    async fn test_token_loaded_from_storage_when_memory_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversation/credit/balance"))
            .and(header("authorization", "Bearer stored"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"creditsBalance": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _, storage) = client_for(&server);
        storage.set_item(ACCESS_TOKEN_KEY, "stored").unwrap();

        assert!(client.get_credit_balance().await.is_ok());
    }

    #[tokio::test]
    async fn test_unauthorized_refreshes_and_retries_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversation/metadata/5"))
            .and(header("authorization", "Bearer old"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/Token/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body("new", &far_future())))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/conversation/metadata/5"))
            .and(header("authorization", "Bearer new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session": {"sessionId": 5, "currentPhase": "In analyze"},
                "rounds": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, creds, storage) = client_for(&server);
        creds.set("old", None).unwrap();

        let metadata = client.get_session_metadata(5).await.unwrap();

        assert_eq!(metadata.session.session_id, 5);
        assert_eq!(creds.access_token().as_deref(), Some("new"));
        assert_eq!(storage.get_item(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_credentials_and_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversation/status"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "title": "Unauthorized", "status": 401, "detail": "Token expired"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/Token/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let (client, creds, storage) = client_for(&server);
        creds.set("old", None).unwrap();

        let err = client
            .request_required::<serde_json::Value, ()>(Method::GET, "/conversation/status", None)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Token expired");
        assert!(!creds.is_authenticated());
        assert!(storage.get_item(ACCESS_TOKEN_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Token/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body("fresh", &far_future())))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/conversation/delete/3"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (client, creds, _) = client_for(&server);
        creds
            .set("stale", Some(Utc::now() + Duration::seconds(10)))
            .unwrap();

        client.delete_session(3).await.unwrap();
        assert_eq!(creds.access_token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_requests_share_one_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversation/credit/balance"))
            .and(header("authorization", "Bearer old"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/Token/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body("new", &far_future())))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/conversation/credit/balance"))
            .and(header("authorization", "Bearer new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"creditsBalance": 4})))
            .expect(4)
            .mount(&server)
            .await;

        let (client, creds, _) = client_for(&server);
        creds.set("old", None).unwrap();

        let results = futures::future::join_all((0..4).map(|_| client.get_credit_balance())).await;
        for result in results {
            assert_eq!(result.unwrap().credits_balance, 4);
        }
    }

    #[tokio::test]
    async fn test_problem_details_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/conversation/start"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "type": "https://httpstatuses.io/402",
                "title": "Insufficient credits",
                "detail": "You need at least 3 credits",
                "instance": "/conversation/start"
            })))
            .mount(&server)
            .await;

        let (client, _, _) = client_for(&server);
        let err = client
            .start_session(&StartSessionRequest {
                user_id: 1,
                project_name: Some("Shop".into()),
                project_description: None,
            })
            .await
            .unwrap_err();

        let problem = err.problem_details().unwrap();
        assert_eq!(problem.title.as_deref(), Some("Insufficient credits"));
        assert_eq!(problem.status, Some(402));
        assert_eq!(problem.instance.as_deref(), Some("/conversation/start"));
        assert_eq!(err.to_string(), "You need at least 3 credits");
    }

    #[tokio::test]
    async fn test_plain_error_uses_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversation/3/status"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let (client, _, _) = client_for(&server);
        let err = client.get_session_status(3).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500 }));
        assert_eq!(err.to_string(), "API Error: 500");
    }

    #[tokio::test]
    async fn test_accepted_without_body_starts_generation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/conversation/8/followup-answers/2"))
            .and(body_json(json!({"answers": {"FQ1": "yes"}, "roundeId": 31})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _, _) = client_for(&server);
        let mut answers = serde_json::Map::new();
        answers.insert("FQ1".into(), json!("yes"));
        let outcome = client
            .submit_followup_answers(
                8,
                2,
                &SubmitAnswersRequest {
                    answers,
                    round_id: Some(31),
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome, FollowupOutcome::GenerationStarted);
    }

    #[tokio::test]
    async fn test_accepted_with_body_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/conversation/8/followup-answers/1"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "roundMetadata": {"roundNumber": 1, "confidenceScoreAfterExpected": 0.7,
                                   "requiresAnotherRound": true},
                "questions": [{"questionId": 1, "questionText": "Regions?"}],
                "roundNumber": 2
            })))
            .mount(&server)
            .await;

        let (client, _, _) = client_for(&server);
        let outcome = client
            .submit_followup_answers(
                8,
                1,
                &SubmitAnswersRequest {
                    answers: serde_json::Map::new(),
                    round_id: None,
                },
            )
            .await
            .unwrap();

        match outcome {
            FollowupOutcome::Analyzed(analysis) => {
                assert_eq!(analysis.round_number, 2);
                assert_eq!(analysis.questions[0].question.as_deref(), Some("Regions?"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_content_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/conversation/4/approve-domain"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _, _) = client_for(&server);
        client.approve_domain(4).await.unwrap();
    }

    #[tokio::test]
    async fn test_sessions_by_status_encodes_space() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversation/all/by/In%20analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"sessionId": 1, "projectName": "Shop"},
                {"sessionId": 2, "projectName": "Clinic"}
            ])))
            .mount(&server)
            .await;

        let (client, _, _) = client_for(&server);
        let sessions = client.get_sessions_by_status("In analyze").await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[1].project_name.as_deref(), Some("Clinic"));
    }

    #[tokio::test]
    async fn test_download_returns_bytes_after_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/system/download/session/6"))
            .and(header("authorization", "Bearer old"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/Token/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body("new", &far_future())))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/system/download/session/6"))
            .and(header("authorization", "Bearer new"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x50, 0x4b, 0x03, 0x04]))
            .mount(&server)
            .await;

        let (client, creds, _) = client_for(&server);
        creds.set("old", None).unwrap();

        let bytes = client.download_project(6).await.unwrap();
        assert_eq!(bytes, vec![0x50, 0x4b, 0x03, 0x04]);
    }

    #[tokio::test]
    async fn test_plans_accept_single_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Plans/details"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": 1, "name": "Free", "priceMonthly": 0},
                "errors": null,
                "hasErrors": false
            })))
            .mount(&server)
            .await;

        let (client, _, _) = client_for(&server);
        let plans = client.get_plans().await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].name.as_deref(), Some("Free"));
    }

    #[tokio::test]
    async fn test_handle_connection_error() {
        let storage = Arc::new(InMemoryStorage::new());
        let creds = CredentialStore::new(storage, 60);
        // Nothing listens on this port
        let client = ApiClient::new("http://127.0.0.1:59999", creds).unwrap();

        let err = client.get_credit_balance().await.unwrap_err();
        assert!(matches!(err, ApiError::Http(_)));
    }

    #[test]
    fn test_urls() {
        let storage = Arc::new(InMemoryStorage::new());
        let creds = CredentialStore::new(storage, 60);
        let client = ApiClient::new("https://example.com/api/", creds).unwrap();
        assert_eq!(client.login_url(), "https://example.com/api/GoogleLogin/login");
        assert_eq!(
            client.download_url(12),
            "https://example.com/api/system/download/session/12"
        );
    }
}
