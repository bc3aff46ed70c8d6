use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use super::flow::{string_id, FlowId, StepId};
use super::null_as_default;

/// Value object: Session ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

string_id!(SessionId);

/// Server-side session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Answers are still being collected
    #[default]
    InProgress,
    /// Terminal, the summary is available
    Completed,
}

/// One stored answer, keyed by step id in [`Session::answers`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Submitted answer
    #[serde(default, deserialize_with = "null_as_default")]
    pub answer: String,

    /// When the answer was accepted
    #[serde(default)]
    pub answered_at: Option<DateTime<Utc>>,

    /// Client metadata sent with the answer
    #[serde(default)]
    pub metadata: Value,
}

/// A flow execution instance as returned by `GET /flows/{flowId}/execute/{sessionId}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier
    #[serde(alias = "id")]
    pub session_id: SessionId,

    /// Flow being executed
    #[serde(default)]
    pub flow_id: Option<FlowId>,

    /// Step the server expects next
    #[serde(default)]
    pub current_step_id: Option<StepId>,

    /// Status
    #[serde(default)]
    pub status: SessionStatus,

    /// Answers given so far
    #[serde(default, deserialize_with = "null_as_default")]
    pub answers: HashMap<StepId, AnswerRecord>,

    /// Start timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Completion timestamp
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Response of `POST /flows/{flowId}/execute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartedSession {
    /// New session identifier
    #[serde(alias = "id")]
    pub session_id: SessionId,

    /// First step, when the server reports it
    #[serde(default)]
    pub current_step_id: Option<StepId>,

    /// Status, `in_progress` for a fresh session
    #[serde(default)]
    pub status: SessionStatus,
}

/// Body of `POST /flows/{flowId}/execute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartSessionRequest {
    /// Flow to execute
    pub flow_id: FlowId,
    /// Opaque client data attached to the session
    #[serde(default)]
    pub session_data: Value,
}

impl StartSessionRequest {
    /// Request with empty session data
    pub fn new(flow_id: FlowId) -> Self {
        Self {
            flow_id,
            session_data: Value::Object(Default::default()),
        }
    }
}

/// Metadata sent with every answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerMetadata {
    /// Client-side submission time
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /flows/{flowId}/execute/{sessionId}/answer`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    /// Answered step
    pub step_id: StepId,
    /// Answer text or selected option value
    pub answer: String,
    /// Submission metadata
    pub metadata: AnswerMetadata,
}

impl AnswerSubmission {
    /// The record the server stores for this submission
    pub fn to_record(&self) -> AnswerRecord {
        AnswerRecord {
            answer: self.answer.clone(),
            answered_at: Some(self.metadata.timestamp),
            metadata: serde_json::to_value(&self.metadata).unwrap_or(Value::Null),
        }
    }
}

/// Response of the answer submission endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmitOutcome {
    /// The submitted step was the last one
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_completed: bool,

    /// Step to show next
    #[serde(default)]
    pub next_step_id: Option<StepId>,
}

/// One answered question in a [`Summary`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    /// Position of the step in the flow
    pub step_order: u32,
    /// Question text
    pub question: String,
    /// Submitted answer
    #[serde(default, deserialize_with = "null_as_default")]
    pub answer: String,
}

/// Completed-session report from `GET .../summary`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Answered questions in step order
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed_steps: Vec<SummaryEntry>,

    /// Time from session start to completion
    #[serde(default, deserialize_with = "whole_seconds")]
    pub total_time_seconds: u64,
}

impl Summary {
    /// Total time as `"{minutes}m {seconds}s"`
    pub fn formatted_total_time(&self) -> String {
        format!("{}m {}s", self.total_time_seconds / 60, self.total_time_seconds % 60)
    }

    /// Entry for a given step order
    pub fn entry(&self, step_order: u32) -> Option<&SummaryEntry> {
        self.completed_steps.iter().find(|e| e.step_order == step_order)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.completed_steps {
            writeln!(f, "Q{}. {}", entry.step_order, entry.question)?;
            writeln!(f, "Answer: {}", entry.answer)?;
        }
        write!(
            f,
            "Total time: {} ({} steps completed)",
            self.formatted_total_time(),
            self.completed_steps.len()
        )
    }
}

// Backends report elapsed time as a float.
fn whole_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    if seconds.is_finite() && seconds > 0.0 {
        Ok(seconds.floor() as u64)
    } else {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_deserializes_answers_keyed_by_step() {
        let session: Session = serde_json::from_value(json!({
            "session_id": "sess-1",
            "flow_id": "f1",
            "current_step_id": "s2",
            "status": "in_progress",
            "answers": {
                "s1": {
                    "answer": "A",
                    "answered_at": "2026-01-05T10:00:00Z",
                    "metadata": {"timestamp": "2026-01-05T10:00:00Z"}
                }
            }
        }))
        .unwrap();

        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.current_step_id, Some(StepId("s2".to_string())));
        assert_eq!(session.answers[&StepId("s1".to_string())].answer, "A");
    }

    #[test]
    fn test_session_accepts_id_alias_and_null_answers() {
        let session: Session = serde_json::from_value(json!({
            "id": "sess-2",
            "status": "completed",
            "answers": null
        }))
        .unwrap();

        assert_eq!(session.session_id, SessionId("sess-2".to_string()));
        assert!(session.answers.is_empty());
        assert_eq!(session.current_step_id, None);
    }

    #[test]
    fn test_submission_wire_shape() {
        let submission = AnswerSubmission {
            step_id: StepId("s1".to_string()),
            answer: "hello".to_string(),
            metadata: AnswerMetadata {
                timestamp: "2026-01-05T10:00:00Z".parse().unwrap(),
            },
        };
        assert_eq!(
            serde_json::to_value(&submission).unwrap(),
            json!({
                "step_id": "s1",
                "answer": "hello",
                "metadata": {"timestamp": "2026-01-05T10:00:00Z"}
            })
        );
    }

    #[test]
    fn test_submit_outcome_variants() {
        let done: SubmitOutcome = serde_json::from_value(json!({"is_completed": true})).unwrap();
        assert!(done.is_completed);
        assert_eq!(done.next_step_id, None);

        let next: SubmitOutcome =
            serde_json::from_value(json!({"is_completed": false, "next_step_id": "s3"})).unwrap();
        assert_eq!(next.next_step_id, Some(StepId("s3".to_string())));
    }

    #[test]
    fn test_summary_time_formatting_and_float_seconds() {
        let summary: Summary = serde_json::from_value(json!({
            "completed_steps": [
                {"step_order": 2, "question": "Pick", "answer": "A"},
                {"step_order": 3, "question": "Name", "answer": null}
            ],
            "total_time_seconds": 125.7
        }))
        .unwrap();

        assert_eq!(summary.total_time_seconds, 125);
        assert_eq!(summary.formatted_total_time(), "2m 5s");
        assert_eq!(summary.entry(3).map(|e| e.answer.as_str()), Some(""));
        assert!(summary.to_string().ends_with("Total time: 2m 5s (2 steps completed)"));
    }
}
