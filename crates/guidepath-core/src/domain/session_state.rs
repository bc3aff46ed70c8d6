use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::warn;

use crate::domain::events::{
    AnswerRecorded, IntegrityGapDetected, SessionCompleted, SessionEvent, SessionResumed,
    SessionStarted, StepAdvanced,
};
use crate::domain::flow::{Flow, StepId};
use crate::domain::session::{
    AnswerMetadata, AnswerSubmission, Session, SessionId, SessionStatus, StartedSession,
    SubmitOutcome, Summary,
};
use crate::domain::step::{Step, StepDisplay};
use crate::domain::validation::{validate, ValidationResult};
use crate::CoreError;

/// Lifecycle phase of a flow execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing fetched yet
    Uninitialized,

    /// Creating a new session
    Starting,

    /// Fetching an existing session
    Resuming,

    /// Collecting answers
    InProgress,

    /// Terminal
    Completed,
}

/// Result of a `Next` action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextOutcome {
    /// The draft failed validation and nothing was sent
    Rejected(String),

    /// The answer was accepted and the step at `index` is now active
    Advanced {
        /// New active step index
        index: usize,
    },

    /// The answer completed the session
    Completed,
}

/// Value object: everything one flow execution holds locally
#[derive(Debug)]
pub struct SessionState {
    phase: SessionPhase,
    flow: Option<Flow>,
    steps: Vec<Step>,
    session_id: Option<SessionId>,
    current_step_index: usize,
    draft: String,
    answers: HashMap<StepId, String>,
    validation_error: Option<String>,
    summary: Option<Summary>,
    events: Vec<Box<dyn SessionEvent>>,
}

impl Clone for SessionState {
    fn clone(&self) -> Self {
        Self {
            phase: self.phase,
            flow: self.flow.clone(),
            steps: self.steps.clone(),
            session_id: self.session_id.clone(),
            current_step_index: self.current_step_index,
            draft: self.draft.clone(),
            answers: self.answers.clone(),
            validation_error: self.validation_error.clone(),
            summary: self.summary.clone(),
            events: Vec::new(), // Events belong to the original
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Create an uninitialized state
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            flow: None,
            steps: Vec::new(),
            session_id: None,
            current_step_index: 0,
            draft: String::new(),
            answers: HashMap::with_capacity(16),
            validation_error: None,
            summary: None,
            events: Vec::with_capacity(8),
        }
    }

    /// Uninitialized → Starting
    pub fn begin_start(&mut self) -> Result<(), CoreError> {
        self.require(SessionPhase::Uninitialized, "start a session")?;
        self.phase = SessionPhase::Starting;
        Ok(())
    }

    /// Uninitialized → Resuming
    pub fn begin_resume(&mut self) -> Result<(), CoreError> {
        self.require(SessionPhase::Uninitialized, "resume a session")?;
        self.phase = SessionPhase::Resuming;
        Ok(())
    }

    /// Starting|Resuming → Uninitialized after a failed fetch
    pub fn abort_initialization(&mut self) {
        if matches!(self.phase, SessionPhase::Starting | SessionPhase::Resuming) {
            *self = Self::new();
        }
    }

    /// Starting → InProgress at step index 0
    pub fn session_started(
        &mut self,
        flow: Flow,
        steps: Vec<Step>,
        started: StartedSession,
    ) -> Result<(), CoreError> {
        self.require(SessionPhase::Starting, "finish starting")?;

        let flow_id = flow.id.clone();
        self.flow = Some(flow);
        self.steps = steps;
        self.session_id = Some(started.session_id.clone());
        self.current_step_index = 0;
        self.draft.clear();
        self.answers.clear();
        self.phase = SessionPhase::InProgress;

        self.record_event(Box::new(SessionStarted {
            session_id: started.session_id,
            flow_id,
            timestamp: Utc::now(),
        }));
        Ok(())
    }

    /// Resuming → InProgress, or straight to Completed for a finished session
    ///
    /// An unknown or missing `current_step_id` lands on index 0.
    pub fn session_resumed(
        &mut self,
        flow: Flow,
        steps: Vec<Step>,
        session: Session,
    ) -> Result<(), CoreError> {
        self.require(SessionPhase::Resuming, "finish resuming")?;

        self.flow = Some(flow);
        self.steps = steps;
        self.session_id = Some(session.session_id.clone());
        self.answers = session
            .answers
            .into_iter()
            .map(|(step_id, record)| (step_id, record.answer))
            .collect();

        if session.status == SessionStatus::Completed {
            self.current_step_index = self.steps.len().saturating_sub(1);
            self.draft.clear();
            self.phase = SessionPhase::Completed;
            return Ok(());
        }

        let resolved = session
            .current_step_id
            .as_ref()
            .and_then(|id| self.index_of(id));

        self.current_step_index = match resolved {
            Some(index) => index,
            None => {
                warn!(
                    session_id = %session.session_id,
                    current_step_id = ?session.current_step_id,
                    "Current step not found in step list, starting from the first step"
                );
                self.record_event(Box::new(IntegrityGapDetected {
                    session_id: session.session_id.clone(),
                    step_id: session.current_step_id.clone(),
                    timestamp: Utc::now(),
                }));
                0
            }
        };

        self.draft = self.cached_answer_at(self.current_step_index);
        self.phase = SessionPhase::InProgress;

        self.record_event(Box::new(SessionResumed {
            session_id: session.session_id,
            step_index: self.current_step_index,
            restored_answers: self.answers.len(),
            timestamp: Utc::now(),
        }));
        Ok(())
    }

    /// Replace the draft for the active step
    pub fn set_draft(&mut self, value: impl Into<String>) -> Result<(), CoreError> {
        self.require(SessionPhase::InProgress, "edit the answer")?;
        self.draft = value.into();
        self.validation_error = None;
        Ok(())
    }

    /// Validate the draft against the active step, remembering the failure
    pub fn validate_draft(&mut self) -> Result<ValidationResult, CoreError> {
        self.require(SessionPhase::InProgress, "validate the answer")?;
        let step = self
            .current_step()
            .ok_or_else(|| CoreError::InvalidTransition("Flow has no steps".to_string()))?;

        let result = validate(step, &self.draft);
        self.validation_error = result.reason().map(str::to_string);
        Ok(result)
    }

    /// The submission for the active step and draft
    pub fn submission(&self, at: DateTime<Utc>) -> Result<AnswerSubmission, CoreError> {
        self.require(SessionPhase::InProgress, "submit an answer")?;
        let step = self
            .current_step()
            .ok_or_else(|| CoreError::InvalidTransition("Flow has no steps".to_string()))?;

        Ok(AnswerSubmission {
            step_id: step.id.clone(),
            answer: self.draft.clone(),
            metadata: AnswerMetadata { timestamp: at },
        })
    }

    /// Apply the API's answer to a submission
    ///
    /// The answer is cached even when the next step cannot be resolved, since
    /// the server has already stored it.
    pub fn apply_outcome(
        &mut self,
        submission: &AnswerSubmission,
        outcome: SubmitOutcome,
    ) -> Result<NextOutcome, CoreError> {
        self.require(SessionPhase::InProgress, "apply a submission")?;
        let session_id = self.session_id_or_err()?;

        let replaced = self
            .answers
            .insert(submission.step_id.clone(), submission.answer.clone())
            .is_some();
        self.record_event(Box::new(AnswerRecorded {
            session_id: session_id.clone(),
            step_id: submission.step_id.clone(),
            replaced,
            timestamp: Utc::now(),
        }));

        if outcome.is_completed {
            self.phase = SessionPhase::Completed;
            self.draft.clear();
            self.validation_error = None;
            self.record_event(Box::new(SessionCompleted {
                session_id,
                timestamp: Utc::now(),
            }));
            return Ok(NextOutcome::Completed);
        }

        let next_index = outcome
            .next_step_id
            .as_ref()
            .and_then(|id| self.index_of(id));

        match next_index {
            Some(index) => {
                let from_index = self.current_step_index;
                self.current_step_index = index;
                self.draft.clear();
                self.validation_error = None;
                self.record_event(Box::new(StepAdvanced {
                    session_id,
                    from_index,
                    to_index: index,
                    timestamp: Utc::now(),
                }));
                Ok(NextOutcome::Advanced { index })
            }
            None => {
                self.record_event(Box::new(IntegrityGapDetected {
                    session_id,
                    step_id: outcome.next_step_id.clone(),
                    timestamp: Utc::now(),
                }));
                Err(CoreError::IntegrityGap {
                    step_id: outcome.next_step_id.map(|id| id.0),
                })
            }
        }
    }

    /// Move back one step and restore its cached answer
    pub fn go_previous(&mut self) -> Result<usize, CoreError> {
        self.require(SessionPhase::InProgress, "go back")?;
        if self.current_step_index == 0 {
            return Err(CoreError::InvalidTransition(
                "Already at the first step".to_string(),
            ));
        }

        self.current_step_index -= 1;
        self.draft = self.cached_answer_at(self.current_step_index);
        self.validation_error = None;
        Ok(self.current_step_index)
    }

    /// Store the summary of a completed session
    pub fn attach_summary(&mut self, summary: Summary) -> Result<(), CoreError> {
        self.require(SessionPhase::Completed, "attach a summary")?;
        self.summary = Some(summary);
        Ok(())
    }

    /// Current phase
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Flow metadata, once fetched
    pub fn flow(&self) -> Option<&Flow> {
        self.flow.as_ref()
    }

    /// Ordered step list
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Session id, once known
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// 0-based position of the active step
    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    /// Active step
    pub fn current_step(&self) -> Option<&Step> {
        self.steps.get(self.current_step_index)
    }

    /// Draft for the active step
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Locally cached answers by step
    pub fn answers(&self) -> &HashMap<StepId, String> {
        &self.answers
    }

    /// Cached answer for a step
    pub fn answer(&self, step_id: &StepId) -> Option<&str> {
        self.answers.get(step_id).map(String::as_str)
    }

    /// Reason the last validation failed
    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    /// Summary of a completed session
    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    /// `(index + 1) / len * 100`, 0 for an empty flow
    pub fn progress_percent(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        (self.current_step_index + 1) as f64 / self.steps.len() as f64 * 100.0
    }

    /// "Step X of N"
    pub fn position(&self) -> String {
        if self.steps.is_empty() {
            return "Step 0 of 0".to_string();
        }
        format!("Step {} of {}", self.current_step_index + 1, self.steps.len())
    }

    /// Whether the active step is the last one
    pub fn is_last_step(&self) -> bool {
        !self.steps.is_empty() && self.current_step_index + 1 == self.steps.len()
    }

    /// Label of the advancing control
    pub fn advance_label(&self) -> &'static str {
        if self.is_last_step() {
            "Complete"
        } else {
            "Next"
        }
    }

    /// Whether `Previous` is allowed
    pub fn can_go_back(&self) -> bool {
        self.phase == SessionPhase::InProgress && self.current_step_index > 0
    }

    /// Whether the advancing control is enabled
    pub fn can_advance(&self, submitting: bool) -> bool {
        if submitting || self.phase != SessionPhase::InProgress {
            return false;
        }
        match self.current_step() {
            Some(step) => !step.expects_answer() || !self.draft.is_empty(),
            None => false,
        }
    }

    /// View model of the active step
    pub fn current_display(&self) -> Option<StepDisplay> {
        self.current_step().map(|step| step.display(&self.draft))
    }

    /// Drain recorded events
    pub fn take_events(&mut self) -> Vec<Box<dyn SessionEvent>> {
        std::mem::take(&mut self.events)
    }

    fn record_event(&mut self, event: Box<dyn SessionEvent>) {
        self.events.push(event);
    }

    fn require(&self, phase: SessionPhase, action: &str) -> Result<(), CoreError> {
        if self.phase != phase {
            return Err(CoreError::InvalidTransition(format!(
                "Cannot {} in phase {:?}",
                action, self.phase
            )));
        }
        Ok(())
    }

    fn session_id_or_err(&self) -> Result<SessionId, CoreError> {
        self.session_id
            .clone()
            .ok_or_else(|| CoreError::InvalidTransition("No session id".to_string()))
    }

    fn index_of(&self, step_id: &StepId) -> Option<usize> {
        self.steps.iter().position(|step| &step.id == step_id)
    }

    fn cached_answer_at(&self, index: usize) -> String {
        self.steps
            .get(index)
            .and_then(|step| self.answers.get(&step.id))
            .cloned()
            .unwrap_or_default()
    }
}
