use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::api::FlowApi;
use crate::domain::events::SessionEvent;
use crate::domain::flow::{Flow, FlowId};
use crate::domain::link::ExecutionLink;
use crate::domain::session::SessionId;
use crate::domain::session_state::{NextOutcome, SessionPhase, SessionState};
use crate::domain::step::{order_steps, Step, StepKind};
use crate::domain::validation::ValidationResult;
use crate::CoreError;

/// Drives one flow execution against a [`FlowApi`]
///
/// API failures are logged and returned; the state is left as it was before
/// the failed action so the same action can be retried.
pub struct FlowExecutionController {
    api: Arc<dyn FlowApi>,
    flow_id: FlowId,
    requested_session: Option<SessionId>,
    state: Mutex<SessionState>,
    submitting: AtomicBool,
}

/// Holds the submitting flag for the lifetime of one submission
struct SubmitGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, CoreError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CoreError::SubmissionInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl FlowExecutionController {
    /// Create a controller for the execution named by `link`
    pub fn new(api: Arc<dyn FlowApi>, link: ExecutionLink) -> Self {
        Self {
            api,
            flow_id: link.flow_id,
            requested_session: link.session_id,
            state: Mutex::new(SessionState::new()),
            submitting: AtomicBool::new(false),
        }
    }

    /// Fetch flow and steps, then start or resume the session
    ///
    /// On failure the controller returns to `Uninitialized` and may be
    /// initialized again.
    #[instrument(skip(self), fields(flow_id = %self.flow_id))]
    pub async fn initialize(&self) -> Result<(), CoreError> {
        {
            let mut state = self.state.lock().await;
            match &self.requested_session {
                Some(_) => state.begin_resume()?,
                None => state.begin_start()?,
            }
        }

        match self.load_session().await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(error = %e, "Failed to initialize flow execution");
                self.state.lock().await.abort_initialization();
                Err(e)
            }
        }
    }

    async fn load_session(&self) -> Result<(), CoreError> {
        let flow: Flow = self.api.get_flow(&self.flow_id).await?;
        let steps: Vec<Step> = order_steps(&self.flow_id, self.api.list_steps(&self.flow_id).await?)?;
        debug!(steps = steps.len(), title = %flow.title, "Fetched flow");

        match &self.requested_session {
            None => {
                let started = self.api.start_session(&self.flow_id).await?;
                info!(session_id = %started.session_id, "Started session");
                self.state.lock().await.session_started(flow, steps, started)
            }
            Some(session_id) => {
                let session = self.api.get_session(&self.flow_id, session_id).await?;
                info!(session_id = %session_id, status = ?session.status, "Resuming session");
                let completed = {
                    let mut state = self.state.lock().await;
                    state.session_resumed(flow, steps, session)?;
                    state.phase() == SessionPhase::Completed
                };
                if completed {
                    self.fetch_summary_on_completion().await;
                }
                Ok(())
            }
        }
    }

    /// Validate and submit the draft of the active step
    ///
    /// Only one submission may be in flight; a concurrent call fails with
    /// [`CoreError::SubmissionInProgress`].
    #[instrument(skip(self), fields(flow_id = %self.flow_id))]
    pub async fn next(&self) -> Result<NextOutcome, CoreError> {
        let _guard = SubmitGuard::acquire(&self.submitting)?;

        let (session_id, submission) = {
            let mut state = self.state.lock().await;
            if let ValidationResult::Invalid(reason) = state.validate_draft()? {
                debug!(%reason, "Draft rejected");
                return Ok(NextOutcome::Rejected(reason));
            }
            let submission = state.submission(Utc::now())?;
            let session_id = state
                .session_id()
                .cloned()
                .ok_or_else(|| CoreError::InvalidTransition("No session id".to_string()))?;
            (session_id, submission)
        };

        let outcome = self
            .api
            .submit_answer(&self.flow_id, &session_id, &submission)
            .await
            .map_err(|e| {
                error!(error = %e, step_id = %submission.step_id, "Failed to submit answer");
                e
            })?;

        let result = self.state.lock().await.apply_outcome(&submission, outcome);
        match result {
            Ok(NextOutcome::Completed) => {
                info!(session_id = %session_id, "Session completed");
                self.fetch_summary_on_completion().await;
                Ok(NextOutcome::Completed)
            }
            Ok(outcome) => {
                debug!(?outcome, "Answer accepted");
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, "Submitted answer did not lead to a known step");
                Err(e)
            }
        }
    }

    /// Go back one step without contacting the API
    pub async fn previous(&self) -> Result<usize, CoreError> {
        self.state.lock().await.go_previous()
    }

    /// Replace the draft of a text step
    pub async fn set_text(&self, value: impl Into<String>) -> Result<(), CoreError> {
        self.state.lock().await.set_draft(value)
    }

    /// Select an option of the active multiple choice step
    pub async fn select_option(&self, value: &str) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        let accepted = match state.current_step().map(Step::kind) {
            Some(StepKind::MultipleChoice { options }) => {
                options.iter().any(|option| option.value == value)
            }
            _ => false,
        };
        if !accepted {
            return Err(CoreError::InvalidInput(format!(
                "'{}' is not an option of the current step",
                value
            )));
        }
        state.set_draft(value)
    }

    /// Fetch the summary of a completed session again
    pub async fn refresh_summary(&self) -> Result<(), CoreError> {
        let session_id = {
            let state = self.state.lock().await;
            if state.phase() != SessionPhase::Completed {
                return Err(CoreError::InvalidTransition(format!(
                    "Cannot fetch a summary in phase {:?}",
                    state.phase()
                )));
            }
            state
                .session_id()
                .cloned()
                .ok_or_else(|| CoreError::InvalidTransition("No session id".to_string()))?
        };

        let summary = self
            .api
            .get_summary(&self.flow_id, &session_id)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch summary");
                e
            })?;
        self.state.lock().await.attach_summary(summary)
    }

    async fn fetch_summary_on_completion(&self) {
        if let Err(e) = self.refresh_summary().await {
            warn!(error = %e, "Summary unavailable, it can be fetched again later");
        }
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Drain events recorded since the last call
    pub async fn take_events(&self) -> Vec<Box<dyn SessionEvent>> {
        let events = self.state.lock().await.take_events();
        for event in &events {
            debug!(
                event_type = event.event_type(),
                session_id = %event.session_id(),
                "Session event"
            );
        }
        events
    }

    /// Resumable link; carries the session id once one exists
    pub async fn link(&self) -> ExecutionLink {
        let state = self.state.lock().await;
        ExecutionLink {
            flow_id: self.flow_id.clone(),
            session_id: state
                .session_id()
                .cloned()
                .or_else(|| self.requested_session.clone()),
        }
    }

    /// Whether a submission is in flight
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }
}
