//! A `wiremock` stand-in for the Flow REST backend.

use guidepath_client::{ClientConfig, RemoteFlowApi};
use guidepath_core::{Flow, FlowId, Session, SessionId, Step, StepId, SubmitOutcome, Summary};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token the fake backend expects
pub const TEST_TOKEN: &str = "test-token";

/// Mock Flow API server
pub struct FlowApiServer {
    server: MockServer,
}

impl FlowApiServer {
    /// Start a new server on a random port
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Underlying mock server, for custom mocks
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    /// Client configuration pointing at this server
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.server.uri()).with_token(TEST_TOKEN)
    }

    /// REST client pointing at this server
    pub fn client(&self) -> RemoteFlowApi {
        match RemoteFlowApi::new(self.config()) {
            Ok(client) => client,
            Err(e) => panic!("Failed to create test client: {}", e),
        }
    }

    /// Serve flow metadata and steps
    pub async fn mount_flow(&self, flow: &Flow, steps: &[Step]) {
        Mock::given(method("GET"))
            .and(path(format!("/api/flows/{}", flow.id)))
            .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(flow))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/api/flows/{}/steps", flow.id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(steps))
            .mount(&self.server)
            .await;
    }

    /// Answer `POST /flows/{flowId}/execute` with `session_id`, exactly once
    pub async fn mount_start(&self, flow_id: &FlowId, session_id: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/api/flows/{}/execute", flow_id)))
            .and(body_partial_json(json!({"flow_id": flow_id})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session_id": session_id,
                "status": "in_progress"
            })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Serve an existing session
    pub async fn mount_session(&self, flow_id: &FlowId, session: &Session) {
        Mock::given(method("GET"))
            .and(path(format!("/api/flows/{}/execute/{}", flow_id, session.session_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(session))
            .mount(&self.server)
            .await;
    }

    /// Answer a submission for `step_id` with `outcome`
    pub async fn mount_answer(
        &self,
        flow_id: &FlowId,
        session_id: &SessionId,
        step_id: &StepId,
        outcome: &SubmitOutcome,
    ) {
        Mock::given(method("POST"))
            .and(path(format!("/api/flows/{}/execute/{}/answer", flow_id, session_id)))
            .and(body_partial_json(json!({"step_id": step_id})))
            .respond_with(ResponseTemplate::new(200).set_body_json(outcome))
            .mount(&self.server)
            .await;
    }

    /// Serve the summary, expecting exactly `times` requests
    pub async fn mount_summary(
        &self,
        flow_id: &FlowId,
        session_id: &SessionId,
        summary: &Summary,
        times: u64,
    ) {
        Mock::given(method("GET"))
            .and(path(format!("/api/flows/{}/execute/{}/summary", flow_id, session_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(summary))
            .expect(times)
            .mount(&self.server)
            .await;
    }
}
