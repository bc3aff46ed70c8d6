use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use guidepath_core::{
    AnswerSubmission, CoreError, Flow, FlowApi, FlowAuthoring, FlowDraft, FlowId, FlowQuery,
    Session, SessionId, StartSessionRequest, StartedSession, Step, StepDraft, StepId,
    SubmitOutcome, Summary,
};

use crate::config::ClientConfig;

/// Flow API over HTTP
#[derive(Debug, Clone)]
pub struct RemoteFlowApi {
    config: ClientConfig,
    api_root: Url,
    client: Client,
}

impl RemoteFlowApi {
    /// Creates a new client; the bearer token becomes a default header
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.auth_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| CoreError::Configuration(format!("Invalid auth token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let api_root = Url::parse(&config.api_root())
            .map_err(|e| CoreError::Configuration(format!("Invalid backend URL: {}", e)))?;
        if api_root.cannot_be_a_base() {
            return Err(CoreError::Configuration(format!(
                "Backend URL cannot carry a path: {}",
                api_root
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.effective_timeout_secs()))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| CoreError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_root,
            client,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// API root extended by `segments`, each percent-encoded as one path segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Maps a transport-level error to a CoreError
    fn map_http_error(&self, error: reqwest::Error) -> CoreError {
        if error.is_timeout() {
            CoreError::Transport(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            CoreError::Transport(format!("Connection error: {}", error))
        } else if error.is_decode() {
            CoreError::Serialization(format!("Failed to decode response: {}", error))
        } else {
            CoreError::Transport(format!("HTTP error: {}", error))
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, CoreError> {
        request.send().await.map_err(|e| self.map_http_error(e))
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: Response,
        resource: &str,
    ) -> Result<T, CoreError> {
        let response = self.check_status(response, resource).await?;
        let body = response.text().await.map_err(|e| self.map_http_error(e))?;
        serde_json::from_str(&body)
            .map_err(|e| CoreError::Serialization(format!("Failed to parse {}: {}", resource, e)))
    }

    async fn check_status(&self, response: Response, resource: &str) -> Result<Response, CoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body, status);
        debug!(status = status.as_u16(), %detail, "Flow API request failed");

        match status {
            StatusCode::NOT_FOUND => Err(CoreError::NotFound(format!("{}: {}", resource, detail))),
            status => Err(CoreError::Api {
                status: status.as_u16(),
                detail,
            }),
        }
    }
}

/// Error message from a FastAPI-style `{"detail": ...}` body
fn error_detail(body: &str, status: StatusCode) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => return detail.clone(),
            Some(Value::Null) | None => {}
            Some(other) => return other.to_string(),
        },
        _ => {}
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        body.trim().to_string()
    }
}

#[async_trait]
impl FlowApi for RemoteFlowApi {
    #[instrument(skip(self))]
    async fn list_flows(&self, query: &FlowQuery) -> Result<Vec<Flow>, CoreError> {
        let request = self
            .client
            .get(self.endpoint(&["flows"]))
            .query(&query.to_query_pairs());
        let response = self.send(request).await?;
        self.read_json(response, "flows").await
    }

    #[instrument(skip(self), fields(flow_id = %flow_id))]
    async fn get_flow(&self, flow_id: &FlowId) -> Result<Flow, CoreError> {
        debug!("Fetching flow");
        let url = self.endpoint(&["flows", flow_id.as_str()]);
        let response = self.send(self.client.get(url)).await?;
        self.read_json(response, "flow").await
    }

    #[instrument(skip(self), fields(flow_id = %flow_id))]
    async fn list_steps(&self, flow_id: &FlowId) -> Result<Vec<Step>, CoreError> {
        let url = self.endpoint(&["flows", flow_id.as_str(), "steps"]);
        let response = self.send(self.client.get(url)).await?;
        self.read_json(response, "steps").await
    }

    #[instrument(skip(self), fields(flow_id = %flow_id))]
    async fn start_session(&self, flow_id: &FlowId) -> Result<StartedSession, CoreError> {
        let url = self.endpoint(&["flows", flow_id.as_str(), "execute"]);
        let body = StartSessionRequest::new(flow_id.clone());
        let response = self.send(self.client.post(url).json(&body)).await?;
        self.read_json(response, "session").await
    }

    #[instrument(skip(self), fields(flow_id = %flow_id, session_id = %session_id))]
    async fn get_session(
        &self,
        flow_id: &FlowId,
        session_id: &SessionId,
    ) -> Result<Session, CoreError> {
        let url = self.endpoint(&["flows", flow_id.as_str(), "execute", session_id.as_str()]);
        let response = self.send(self.client.get(url)).await?;
        self.read_json(response, "session").await
    }

    #[instrument(
        skip(self, submission),
        fields(flow_id = %flow_id, session_id = %session_id, step_id = %submission.step_id)
    )]
    async fn submit_answer(
        &self,
        flow_id: &FlowId,
        session_id: &SessionId,
        submission: &AnswerSubmission,
    ) -> Result<SubmitOutcome, CoreError> {
        let url = self.endpoint(&[
            "flows",
            flow_id.as_str(),
            "execute",
            session_id.as_str(),
            "answer",
        ]);
        let response = self.send(self.client.post(url).json(submission)).await?;
        self.read_json(response, "answer").await
    }

    #[instrument(skip(self), fields(flow_id = %flow_id, session_id = %session_id))]
    async fn get_summary(
        &self,
        flow_id: &FlowId,
        session_id: &SessionId,
    ) -> Result<Summary, CoreError> {
        let url = self.endpoint(&[
            "flows",
            flow_id.as_str(),
            "execute",
            session_id.as_str(),
            "summary",
        ]);
        let response = self.send(self.client.get(url)).await?;
        self.read_json(response, "summary").await
    }
}

#[async_trait]
impl FlowAuthoring for RemoteFlowApi {
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    async fn create_flow(&self, draft: &FlowDraft) -> Result<Flow, CoreError> {
        let response = self
            .send(self.client.post(self.endpoint(&["flows"])).json(draft))
            .await?;
        self.read_json(response, "flow").await
    }

    #[instrument(skip(self, draft), fields(flow_id = %flow_id))]
    async fn update_flow(&self, flow_id: &FlowId, draft: &FlowDraft) -> Result<Flow, CoreError> {
        let url = self.endpoint(&["flows", flow_id.as_str()]);
        let response = self.send(self.client.put(url).json(draft)).await?;
        self.read_json(response, "flow").await
    }

    #[instrument(skip(self), fields(flow_id = %flow_id))]
    async fn delete_flow(&self, flow_id: &FlowId) -> Result<(), CoreError> {
        let url = self.endpoint(&["flows", flow_id.as_str()]);
        let response = self.send(self.client.delete(url)).await?;
        self.check_status(response, "flow").await.map(|_| ())
    }

    #[instrument(skip(self, draft), fields(flow_id = %flow_id, step_order = draft.step_order))]
    async fn create_step(&self, flow_id: &FlowId, draft: &StepDraft) -> Result<Step, CoreError> {
        let url = self.endpoint(&["flows", flow_id.as_str(), "steps"]);
        let response = self.send(self.client.post(url).json(draft)).await?;
        self.read_json(response, "step").await
    }

    #[instrument(skip(self, draft), fields(flow_id = %flow_id, step_id = %step_id))]
    async fn update_step(
        &self,
        flow_id: &FlowId,
        step_id: &StepId,
        draft: &StepDraft,
    ) -> Result<Step, CoreError> {
        let url = self.endpoint(&["flows", flow_id.as_str(), "steps", step_id.as_str()]);
        let response = self.send(self.client.put(url).json(draft)).await?;
        self.read_json(response, "step").await
    }

    #[instrument(skip(self), fields(flow_id = %flow_id, step_id = %step_id))]
    async fn delete_step(&self, flow_id: &FlowId, step_id: &StepId) -> Result<(), CoreError> {
        let url = self.endpoint(&["flows", flow_id.as_str(), "steps", step_id.as_str()]);
        let response = self.send(self.client.delete(url)).await?;
        self.check_status(response, "step").await.map(|_| ())
    }
}
