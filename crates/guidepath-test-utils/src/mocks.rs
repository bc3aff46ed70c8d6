//! Mock implementation of the FlowApi trait.

use async_trait::async_trait;
use mockall::mock;

use guidepath_core::{
    AnswerSubmission, CoreError, Flow, FlowApi, FlowId, FlowQuery, Session, SessionId,
    SessionStatus, StartedSession, Step, StepId, SubmitOutcome, Summary,
};

// Generate the mock implementation
mock! {
    pub FlowApi {}

    #[async_trait]
    impl FlowApi for FlowApi {
        async fn list_flows(&self, query: &FlowQuery) -> Result<Vec<Flow>, CoreError>;
        async fn get_flow(&self, flow_id: &FlowId) -> Result<Flow, CoreError>;
        async fn list_steps(&self, flow_id: &FlowId) -> Result<Vec<Step>, CoreError>;
        async fn start_session(&self, flow_id: &FlowId) -> Result<StartedSession, CoreError>;
        async fn get_session(
            &self,
            flow_id: &FlowId,
            session_id: &SessionId,
        ) -> Result<Session, CoreError>;
        async fn submit_answer(
            &self,
            flow_id: &FlowId,
            session_id: &SessionId,
            submission: &AnswerSubmission,
        ) -> Result<SubmitOutcome, CoreError>;
        async fn get_summary(
            &self,
            flow_id: &FlowId,
            session_id: &SessionId,
        ) -> Result<Summary, CoreError>;
    }
}

/// Creates a mock that serves `flow` and `steps` and starts session `session_id`.
///
/// Submission and summary expectations are left to the caller.
pub fn create_mock_flow_api(flow: Flow, steps: Vec<Step>, session_id: &str) -> MockFlowApi {
    let mut mock = MockFlowApi::new();
    let first_step: Option<StepId> = steps.first().map(|s| s.id.clone());

    mock.expect_get_flow()
        .returning(move |_| Ok(flow.clone()));

    mock.expect_list_steps()
        .returning(move |_| Ok(steps.clone()));

    let session_id = SessionId::from(session_id);
    mock.expect_start_session()
        .times(1)
        .returning(move |_| {
            Ok(StartedSession {
                session_id: session_id.clone(),
                current_step_id: first_step.clone(),
                status: SessionStatus::InProgress,
            })
        });

    mock
}
