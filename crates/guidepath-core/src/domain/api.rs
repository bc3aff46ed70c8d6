//! Flow API collaborator interfaces
//!
//! The engine never talks HTTP itself. These traits describe the REST
//! collaborator it consumes; `guidepath-client` implements them over HTTP and
//! [`crate::domain::memory`] implements them in memory.

use async_trait::async_trait;

use super::flow::{Flow, FlowDraft, FlowId, FlowQuery, StepId};
use super::session::{AnswerSubmission, Session, SessionId, StartedSession, SubmitOutcome, Summary};
use super::step::{Step, StepDraft};
use crate::CoreError;

/// Operations the execution engine needs
#[async_trait]
pub trait FlowApi: Send + Sync {
    /// `GET /flows?search=&tags=`
    async fn list_flows(&self, query: &FlowQuery) -> Result<Vec<Flow>, CoreError>;

    /// `GET /flows/{flowId}`
    async fn get_flow(&self, flow_id: &FlowId) -> Result<Flow, CoreError>;

    /// `GET /flows/{flowId}/steps`
    async fn list_steps(&self, flow_id: &FlowId) -> Result<Vec<Step>, CoreError>;

    /// `POST /flows/{flowId}/execute`
    async fn start_session(&self, flow_id: &FlowId) -> Result<StartedSession, CoreError>;

    /// `GET /flows/{flowId}/execute/{sessionId}`
    async fn get_session(
        &self,
        flow_id: &FlowId,
        session_id: &SessionId,
    ) -> Result<Session, CoreError>;

    /// `POST /flows/{flowId}/execute/{sessionId}/answer`
    async fn submit_answer(
        &self,
        flow_id: &FlowId,
        session_id: &SessionId,
        submission: &AnswerSubmission,
    ) -> Result<SubmitOutcome, CoreError>;

    /// `GET /flows/{flowId}/execute/{sessionId}/summary`
    async fn get_summary(
        &self,
        flow_id: &FlowId,
        session_id: &SessionId,
    ) -> Result<Summary, CoreError>;
}

/// Flow editing endpoints used by authoring tools
#[async_trait]
pub trait FlowAuthoring: Send + Sync {
    /// `POST /flows`
    async fn create_flow(&self, draft: &FlowDraft) -> Result<Flow, CoreError>;

    /// `PUT /flows/{flowId}`
    async fn update_flow(&self, flow_id: &FlowId, draft: &FlowDraft) -> Result<Flow, CoreError>;

    /// `DELETE /flows/{flowId}`, cascading to steps and sessions
    async fn delete_flow(&self, flow_id: &FlowId) -> Result<(), CoreError>;

    /// `POST /flows/{flowId}/steps`
    async fn create_step(&self, flow_id: &FlowId, draft: &StepDraft) -> Result<Step, CoreError>;

    /// `PUT /flows/{flowId}/steps/{stepId}`
    async fn update_step(
        &self,
        flow_id: &FlowId,
        step_id: &StepId,
        draft: &StepDraft,
    ) -> Result<Step, CoreError>;

    /// `DELETE /flows/{flowId}/steps/{stepId}`
    async fn delete_step(&self, flow_id: &FlowId, step_id: &StepId) -> Result<(), CoreError>;
}
