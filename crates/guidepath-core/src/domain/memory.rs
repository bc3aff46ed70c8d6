//! In-memory Flow API
//!
//! Behaves like the REST backend the engine talks to: sessions advance in
//! `step_order`, the last answer completes the session, and summaries list
//! answered questions in order. Information steps take part in traversal but
//! do not produce summary rows.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::api::{FlowApi, FlowAuthoring};
use super::flow::{Flow, FlowDraft, FlowId, FlowQuery, StepId};
use super::session::{
    AnswerSubmission, Session, SessionId, SessionStatus, StartedSession, SubmitOutcome, Summary,
    SummaryEntry,
};
use super::step::{order_steps, Step, StepDraft, StepKind};
use crate::CoreError;

/// Operations that can be counted and made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    /// `list_flows`
    ListFlows,
    /// `get_flow`
    GetFlow,
    /// `list_steps`
    ListSteps,
    /// `start_session`
    StartSession,
    /// `get_session`
    GetSession,
    /// `submit_answer`
    SubmitAnswer,
    /// `get_summary`
    GetSummary,
}

struct StoredSession {
    flow_id: FlowId,
    session: Session,
}

/// In-memory implementation of [`FlowApi`] and [`FlowAuthoring`]
pub struct InMemoryFlowApi {
    flows: DashMap<FlowId, Flow>,
    steps: DashMap<FlowId, Vec<Step>>,
    sessions: DashMap<SessionId, StoredSession>,
    pending_failures: DashMap<FailurePoint, CoreError>,
    calls: DashMap<FailurePoint, usize>,
    next_step_override: Mutex<Option<StepId>>,
}

impl InMemoryFlowApi {
    /// Create an empty API
    pub fn new() -> Self {
        Self {
            flows: DashMap::with_capacity(16),
            steps: DashMap::with_capacity(16),
            sessions: DashMap::with_capacity(32),
            pending_failures: DashMap::new(),
            calls: DashMap::new(),
            next_step_override: Mutex::new(None),
        }
    }

    /// Seed a flow and its steps without going through authoring
    pub fn insert_flow(&self, flow: Flow, steps: Vec<Step>) -> Result<(), CoreError> {
        let flow_id = flow.id.clone();
        let mut steps = order_steps(&flow_id, steps)?;
        for step in &mut steps {
            step.flow_id = Some(flow_id.clone());
        }
        self.flows.insert(flow_id.clone(), flow);
        self.steps.insert(flow_id, steps);
        Ok(())
    }

    /// Seed a session, for example one whose progress the server already knows
    pub fn insert_session(&self, flow_id: FlowId, session: Session) {
        self.sessions
            .insert(session.session_id.clone(), StoredSession { flow_id, session });
    }

    /// Current server-side view of a session
    pub fn session(&self, session_id: &SessionId) -> Option<Session> {
        self.sessions.get(session_id).map(|stored| stored.session.clone())
    }

    /// Make the next call of `point` fail with `error`
    pub fn fail_next(&self, point: FailurePoint, error: CoreError) {
        self.pending_failures.insert(point, error);
    }

    /// Make the next non-final submission point at `step_id`
    pub fn override_next_step(&self, step_id: StepId) {
        if let Ok(mut slot) = self.next_step_override.lock() {
            *slot = Some(step_id);
        }
    }

    /// How often `point` has been called
    pub fn call_count(&self, point: FailurePoint) -> usize {
        self.calls.get(&point).map(|count| *count).unwrap_or(0)
    }

    fn enter(&self, point: FailurePoint) -> Result<(), CoreError> {
        *self.calls.entry(point).or_insert(0) += 1;
        match self.pending_failures.remove(&point) {
            Some((_, error)) => {
                debug!(?point, %error, "Injected failure");
                Err(error)
            }
            None => Ok(()),
        }
    }

    fn take_next_step_override(&self) -> Option<StepId> {
        self.next_step_override.lock().ok().and_then(|mut slot| slot.take())
    }

    fn steps_of(&self, flow_id: &FlowId) -> Result<Vec<Step>, CoreError> {
        self.steps
            .get(flow_id)
            .map(|steps| steps.clone())
            .ok_or_else(|| CoreError::NotFound(format!("Flow {}", flow_id)))
    }

    fn bump_version(&self, flow_id: &FlowId) {
        if let Some(mut flow) = self.flows.get_mut(flow_id) {
            flow.version += 1;
            flow.updated_at = Some(Utc::now());
        }
    }

    fn ensure_unique_order(
        steps: &[Step],
        order: u32,
        except: Option<&StepId>,
    ) -> Result<(), CoreError> {
        let taken = steps
            .iter()
            .any(|step| step.step_order == order && Some(&step.id) != except);
        if taken {
            return Err(CoreError::Api {
                status: 409,
                detail: format!("Step order {} already exists in this flow", order),
            });
        }
        Ok(())
    }
}

impl Default for InMemoryFlowApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlowApi for InMemoryFlowApi {
    async fn list_flows(&self, query: &FlowQuery) -> Result<Vec<Flow>, CoreError> {
        self.enter(FailurePoint::ListFlows)?;
        let mut flows: Vec<Flow> = self
            .flows
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        flows.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(flows)
    }

    async fn get_flow(&self, flow_id: &FlowId) -> Result<Flow, CoreError> {
        self.enter(FailurePoint::GetFlow)?;
        self.flows
            .get(flow_id)
            .map(|flow| flow.clone())
            .ok_or_else(|| CoreError::NotFound(format!("Flow {}", flow_id)))
    }

    async fn list_steps(&self, flow_id: &FlowId) -> Result<Vec<Step>, CoreError> {
        self.enter(FailurePoint::ListSteps)?;
        self.steps_of(flow_id)
    }

    async fn start_session(&self, flow_id: &FlowId) -> Result<StartedSession, CoreError> {
        self.enter(FailurePoint::StartSession)?;
        let steps = self.steps_of(flow_id)?;
        let session_id = SessionId(Uuid::new_v4().to_string());
        let current_step_id = steps.first().map(|step| step.id.clone());

        let session = Session {
            session_id: session_id.clone(),
            flow_id: Some(flow_id.clone()),
            current_step_id: current_step_id.clone(),
            status: SessionStatus::InProgress,
            answers: Default::default(),
            created_at: Some(Utc::now()),
            completed_at: None,
        };
        self.insert_session(flow_id.clone(), session);

        Ok(StartedSession {
            session_id,
            current_step_id,
            status: SessionStatus::InProgress,
        })
    }

    async fn get_session(
        &self,
        flow_id: &FlowId,
        session_id: &SessionId,
    ) -> Result<Session, CoreError> {
        self.enter(FailurePoint::GetSession)?;
        self.sessions
            .get(session_id)
            .filter(|stored| &stored.flow_id == flow_id)
            .map(|stored| stored.session.clone())
            .ok_or_else(|| CoreError::NotFound(format!("Session {}", session_id)))
    }

    async fn submit_answer(
        &self,
        flow_id: &FlowId,
        session_id: &SessionId,
        submission: &AnswerSubmission,
    ) -> Result<SubmitOutcome, CoreError> {
        self.enter(FailurePoint::SubmitAnswer)?;
        let steps = self.steps_of(flow_id)?;
        let mut stored = self
            .sessions
            .get_mut(session_id)
            .filter(|stored| &stored.flow_id == flow_id)
            .ok_or_else(|| CoreError::NotFound(format!("Session {}", session_id)))?;

        if stored.session.status == SessionStatus::Completed {
            return Err(CoreError::Api {
                status: 409,
                detail: "Flow execution already completed".to_string(),
            });
        }

        let position = steps
            .iter()
            .position(|step| step.id == submission.step_id)
            .ok_or_else(|| CoreError::Api {
                status: 400,
                detail: format!("Step {} is not part of flow {}", submission.step_id, flow_id),
            })?;

        stored
            .session
            .answers
            .insert(submission.step_id.clone(), submission.to_record());

        match steps.get(position + 1) {
            Some(next) => {
                let next_step_id = self
                    .take_next_step_override()
                    .unwrap_or_else(|| next.id.clone());
                stored.session.current_step_id = Some(next_step_id.clone());
                Ok(SubmitOutcome {
                    is_completed: false,
                    next_step_id: Some(next_step_id),
                })
            }
            None => {
                stored.session.status = SessionStatus::Completed;
                stored.session.completed_at = Some(Utc::now());
                Ok(SubmitOutcome {
                    is_completed: true,
                    next_step_id: None,
                })
            }
        }
    }

    async fn get_summary(
        &self,
        flow_id: &FlowId,
        session_id: &SessionId,
    ) -> Result<Summary, CoreError> {
        self.enter(FailurePoint::GetSummary)?;
        let steps = self.steps_of(flow_id)?;
        let stored = self
            .sessions
            .get(session_id)
            .filter(|stored| &stored.flow_id == flow_id)
            .ok_or_else(|| CoreError::NotFound(format!("Session {}", session_id)))?;

        let session = &stored.session;
        if session.status != SessionStatus::Completed {
            return Err(CoreError::Api {
                status: 400,
                detail: "Flow execution is not completed".to_string(),
            });
        }

        let completed_steps = steps
            .iter()
            .filter(|step| !matches!(step.kind(), StepKind::Information))
            .filter_map(|step| {
                session.answers.get(&step.id).map(|record| SummaryEntry {
                    step_order: step.step_order,
                    question: step.question_text.clone(),
                    answer: record.answer.clone(),
                })
            })
            .collect();

        let total_time_seconds = match (session.created_at, session.completed_at) {
            (Some(start), Some(end)) => (end - start).num_seconds().max(0) as u64,
            _ => 0,
        };

        Ok(Summary {
            completed_steps,
            total_time_seconds,
        })
    }
}

#[async_trait]
impl FlowAuthoring for InMemoryFlowApi {
    async fn create_flow(&self, draft: &FlowDraft) -> Result<Flow, CoreError> {
        let now = Utc::now();
        let flow = Flow {
            id: FlowId(Uuid::new_v4().to_string()),
            title: draft.title.clone(),
            description: draft.description.clone(),
            visibility: draft.visibility,
            tags: draft.tags.clone(),
            version: 1,
            created_by: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.flows.insert(flow.id.clone(), flow.clone());
        self.steps.insert(flow.id.clone(), Vec::new());
        Ok(flow)
    }

    async fn update_flow(&self, flow_id: &FlowId, draft: &FlowDraft) -> Result<Flow, CoreError> {
        let mut flow = self
            .flows
            .get_mut(flow_id)
            .ok_or_else(|| CoreError::NotFound(format!("Flow {}", flow_id)))?;
        flow.title = draft.title.clone();
        flow.description = draft.description.clone();
        flow.visibility = draft.visibility;
        flow.tags = draft.tags.clone();
        flow.version += 1;
        flow.updated_at = Some(Utc::now());
        Ok(flow.clone())
    }

    async fn delete_flow(&self, flow_id: &FlowId) -> Result<(), CoreError> {
        if self.flows.remove(flow_id).is_none() {
            return Err(CoreError::NotFound(format!("Flow {}", flow_id)));
        }
        self.steps.remove(flow_id);
        self.sessions.retain(|_, stored| &stored.flow_id != flow_id);
        Ok(())
    }

    async fn create_step(&self, flow_id: &FlowId, draft: &StepDraft) -> Result<Step, CoreError> {
        if !self.flows.contains_key(flow_id) {
            return Err(CoreError::NotFound(format!("Flow {}", flow_id)));
        }

        let step = {
            let mut steps = self.steps.entry(flow_id.clone()).or_default();
            Self::ensure_unique_order(&steps, draft.step_order, None)?;
            let step = draft
                .clone()
                .into_step(StepId(Uuid::new_v4().to_string()), flow_id.clone());
            steps.push(step.clone());
            steps.sort_by_key(|s| s.step_order);
            step
        };

        self.bump_version(flow_id);
        Ok(step)
    }

    async fn update_step(
        &self,
        flow_id: &FlowId,
        step_id: &StepId,
        draft: &StepDraft,
    ) -> Result<Step, CoreError> {
        let step = {
            let mut steps = self
                .steps
                .get_mut(flow_id)
                .ok_or_else(|| CoreError::NotFound(format!("Flow {}", flow_id)))?;
            let index = steps
                .iter()
                .position(|s| &s.id == step_id)
                .ok_or_else(|| CoreError::NotFound(format!("Step {}", step_id)))?;
            Self::ensure_unique_order(&steps, draft.step_order, Some(step_id))?;

            let step = draft.clone().into_step(step_id.clone(), flow_id.clone());
            steps[index] = step.clone();
            steps.sort_by_key(|s| s.step_order);
            step
        };

        self.bump_version(flow_id);
        Ok(step)
    }

    async fn delete_step(&self, flow_id: &FlowId, step_id: &StepId) -> Result<(), CoreError> {
        {
            let mut steps = self
                .steps
                .get_mut(flow_id)
                .ok_or_else(|| CoreError::NotFound(format!("Flow {}", flow_id)))?;
            let before = steps.len();
            steps.retain(|s| &s.id != step_id);
            if steps.len() == before {
                return Err(CoreError::NotFound(format!("Step {}", step_id)));
            }
        }

        self.bump_version(flow_id);
        Ok(())
    }
}
