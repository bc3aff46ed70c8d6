//!
//! Guidepath Core - guided flow execution engine
//!
//! This crate holds the step model, answer validation, the session state
//! machine and the controller that drives a flow execution against a
//! [`FlowApi`] implementation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - step model, validation, sessions and the Flow API seam
pub mod domain;

/// Application services - execution orchestration
pub mod application;

/// Error types
pub mod error;

// Re-export key types
pub use error::CoreError;

pub use application::execution_controller::FlowExecutionController;
pub use domain::api::{FlowApi, FlowAuthoring};
pub use domain::events::SessionEvent;
pub use domain::flow::{Flow, FlowDraft, FlowId, FlowQuery, StepId, Visibility};
pub use domain::link::ExecutionLink;
pub use domain::session::{
    AnswerMetadata, AnswerRecord, AnswerSubmission, Session, SessionId, SessionStatus,
    StartSessionRequest, StartedSession, SubmitOutcome, Summary, SummaryEntry,
};
pub use domain::session_state::{NextOutcome, SessionPhase, SessionState};
pub use domain::step::{
    order_steps, ChoiceDisplay, ChoiceOption, Step, StepDisplay, StepDraft, StepKind, StepType,
    ValidationRules,
};
pub use domain::validation::{validate, ValidationResult};

#[cfg(feature = "testing")]
pub use domain::memory::{FailurePoint, InMemoryFlowApi};
