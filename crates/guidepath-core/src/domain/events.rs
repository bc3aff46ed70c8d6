use crate::domain::flow::{FlowId, StepId};
use crate::domain::session::SessionId;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Domain event trait for everything a session goes through
pub trait SessionEvent: Debug + Send + Sync {
    /// Returns the type of the event as a string
    fn event_type(&self) -> &'static str;

    /// Returns the session this event belongs to
    fn session_id(&self) -> &SessionId;

    /// Returns the timestamp when the event occurred
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Event: a new session was created by the Flow API
#[derive(Debug)]
pub struct SessionStarted {
    /// The new session
    pub session_id: SessionId,

    /// The flow being executed
    pub flow_id: FlowId,

    /// The timestamp when the session became active
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent for SessionStarted {
    fn event_type(&self) -> &'static str {
        "session.started"
    }

    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: an existing session was re-hydrated
#[derive(Debug)]
pub struct SessionResumed {
    /// The resumed session
    pub session_id: SessionId,

    /// Active step index after resolution
    pub step_index: usize,

    /// Number of answers restored from the server
    pub restored_answers: usize,

    /// The timestamp when the session was resumed
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent for SessionResumed {
    fn event_type(&self) -> &'static str {
        "session.resumed"
    }

    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: the Flow API accepted an answer
#[derive(Debug)]
pub struct AnswerRecorded {
    /// The session
    pub session_id: SessionId,

    /// The answered step
    pub step_id: StepId,

    /// Whether an earlier answer for the step was overwritten
    pub replaced: bool,

    /// The timestamp when the answer was recorded
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent for AnswerRecorded {
    fn event_type(&self) -> &'static str {
        "session.answer_recorded"
    }

    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: the active step changed after a submission
#[derive(Debug)]
pub struct StepAdvanced {
    /// The session
    pub session_id: SessionId,

    /// Index before the move
    pub from_index: usize,

    /// Index after the move
    pub to_index: usize,

    /// The timestamp of the move
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent for StepAdvanced {
    fn event_type(&self) -> &'static str {
        "session.step_advanced"
    }

    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: the session reached its terminal state
#[derive(Debug)]
pub struct SessionCompleted {
    /// The session
    pub session_id: SessionId,

    /// The timestamp of completion
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent for SessionCompleted {
    fn event_type(&self) -> &'static str {
        "session.completed"
    }

    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: the server referenced a step missing from the local step list
#[derive(Debug)]
pub struct IntegrityGapDetected {
    /// The session
    pub session_id: SessionId,

    /// The unknown step id, `None` if the server sent none
    pub step_id: Option<StepId>,

    /// The timestamp when the gap was noticed
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent for IntegrityGapDetected {
    fn event_type(&self) -> &'static str {
        "session.integrity_gap"
    }

    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_types() {
        let session_id = SessionId("sess".to_string());
        let now = Utc::now();
        let events: Vec<Box<dyn SessionEvent>> = vec![
            Box::new(SessionStarted {
                session_id: session_id.clone(),
                flow_id: FlowId("f1".to_string()),
                timestamp: now,
            }),
            Box::new(SessionCompleted { session_id: session_id.clone(), timestamp: now }),
            Box::new(IntegrityGapDetected { session_id: session_id.clone(), step_id: None, timestamp: now }),
        ];

        let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec!["session.started", "session.completed", "session.integrity_gap"]);
        assert!(events.iter().all(|e| e.session_id() == &session_id && e.timestamp() == now));
    }
}
