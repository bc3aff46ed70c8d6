use std::fmt;

use super::flow::FlowId;
use super::session::SessionId;
use crate::CoreError;

/// Deep link to a flow execution: `/flows/{flowId}/execute[/{sessionId}]`
///
/// A link without a session starts a new one; a link with a session resumes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutionLink {
    /// Flow to execute
    pub flow_id: FlowId,
    /// Session to resume
    pub session_id: Option<SessionId>,
}

impl ExecutionLink {
    /// Link that starts a fresh session
    pub fn start(flow_id: impl Into<FlowId>) -> Self {
        Self {
            flow_id: flow_id.into(),
            session_id: None,
        }
    }

    /// Link that resumes an existing session
    pub fn resume(flow_id: impl Into<FlowId>, session_id: impl Into<SessionId>) -> Self {
        Self {
            flow_id: flow_id.into(),
            session_id: Some(session_id.into()),
        }
    }

    /// Same flow, pinned to `session_id`
    pub fn with_session(&self, session_id: SessionId) -> Self {
        Self {
            flow_id: self.flow_id.clone(),
            session_id: Some(session_id),
        }
    }

    /// Path form of the link
    pub fn to_path(&self) -> String {
        match &self.session_id {
            Some(session_id) => format!("/flows/{}/execute/{}", self.flow_id, session_id),
            None => format!("/flows/{}/execute", self.flow_id),
        }
    }

    /// Parse the path form; a trailing slash is tolerated
    pub fn parse(path: &str) -> Result<Self, CoreError> {
        let segments: Vec<&str> = path
            .trim()
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            ["flows", flow_id, "execute"] => Ok(Self::start(*flow_id)),
            ["flows", flow_id, "execute", session_id] => Ok(Self::resume(*flow_id, *session_id)),
            _ => Err(CoreError::InvalidInput(format!("Not a flow execution link: {}", path))),
        }
    }
}

impl fmt::Display for ExecutionLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}
