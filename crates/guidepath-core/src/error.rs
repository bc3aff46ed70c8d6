use thiserror::Error;

/// Core error type for the guided flow engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Network failure, timeout or connection error talking to the Flow API
    #[error("Transport error: {0}")]
    Transport(String),

    /// The Flow API answered with a non-2xx status
    #[error("API error ({status}): {detail}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error detail reported by the backend
        detail: String,
    },

    /// Flow, step list or session not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server referenced a step that is absent from the locally fetched step list
    #[error(
        "Integrity gap: step {} is not part of the fetched step list",
        .step_id.as_deref().unwrap_or("<missing>")
    )]
    IntegrityGap {
        /// Step id the server pointed at, if it sent one
        step_id: Option<String>,
    },

    /// Two steps of the same flow share a `step_order`
    #[error("Duplicate step_order {order} in flow {flow_id}")]
    DuplicateStepOrder {
        /// Flow whose step list is inconsistent
        flow_id: String,
        /// The repeated order value
        order: u32,
    },

    /// Operation invoked in a phase that does not allow it
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// An answer submission is already in flight
    #[error("An answer submission is already in flight")]
    SubmissionInProgress,

    /// Input that the active step cannot accept
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Whether repeating the same user action may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Transport(_) | CoreError::SubmissionInProgress => true,
            CoreError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}
