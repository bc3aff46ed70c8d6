//! Shared fixtures for the guidepath scenario tests.

use chrono::{Duration, TimeZone, Utc};
use guidepath_core::{
    AnswerRecord, FlowId, Session, SessionId, SessionStatus, StepId, SubmitOutcome, Summary,
    SummaryEntry,
};
use serde_json::Value;
use std::collections::HashMap;

/// Session id used by the scenarios
pub const SESSION_ID: &str = "sess-42";

/// Outcome pointing at `step_id`
pub fn advance_to(step_id: &str) -> SubmitOutcome {
    SubmitOutcome {
        is_completed: false,
        next_step_id: Some(StepId::from(step_id)),
    }
}

/// Outcome of the last step
pub fn completed() -> SubmitOutcome {
    SubmitOutcome {
        is_completed: true,
        next_step_id: None,
    }
}

/// Summary for the survey after answering `plan` and `name`
pub fn survey_summary(plan: &str, name: &str) -> Summary {
    Summary {
        completed_steps: vec![
            SummaryEntry {
                step_order: 2,
                question: "Pick a plan".to_string(),
                answer: plan.to_string(),
            },
            SummaryEntry {
                step_order: 3,
                question: "Your name".to_string(),
                answer: name.to_string(),
            },
        ],
        total_time_seconds: 125,
    }
}

/// Server-side session of the survey with `answers` already given
pub fn survey_session(
    current_step: Option<&str>,
    status: SessionStatus,
    answers: &[(&str, &str)],
) -> Session {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single();
    let answers: HashMap<StepId, AnswerRecord> = answers
        .iter()
        .map(|(step, answer)| {
            (
                StepId::from(*step),
                AnswerRecord {
                    answer: answer.to_string(),
                    answered_at: created_at,
                    metadata: Value::Null,
                },
            )
        })
        .collect();

    Session {
        session_id: SessionId::from(SESSION_ID),
        flow_id: Some(FlowId::from("survey")),
        current_step_id: current_step.map(StepId::from),
        status,
        answers,
        created_at,
        completed_at: match status {
            SessionStatus::Completed => created_at.map(|t| t + Duration::seconds(125)),
            SessionStatus::InProgress => None,
        },
    }
}
