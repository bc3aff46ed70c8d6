//! Assertion utilities for validating session states.

use guidepath_core::{SessionPhase, SessionState, Summary};
use thiserror::Error;

/// Error type for session state validation failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionAssertionError {
    #[error("Invalid phase: expected {expected:?}, got {actual:?}")]
    InvalidPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },

    #[error("Invalid step index: expected {expected}, got {actual}")]
    InvalidStepIndex { expected: usize, actual: usize },

    #[error("Summary is missing")]
    MissingSummary,

    #[error("Summary has {actual} entries, expected {expected}")]
    SummaryLength { expected: usize, actual: usize },

    #[error("Summary answer for step {step_order}: expected {expected:?}, got {actual:?}")]
    SummaryAnswer {
        step_order: u32,
        expected: String,
        actual: Option<String>,
    },
}

/// Asserts that the state is in `expected` phase at step `index`.
pub fn assert_position(
    state: &SessionState,
    expected: SessionPhase,
    index: usize,
) -> Result<(), SessionAssertionError> {
    if state.phase() != expected {
        return Err(SessionAssertionError::InvalidPhase {
            expected,
            actual: state.phase(),
        });
    }
    if state.current_step_index() != index {
        return Err(SessionAssertionError::InvalidStepIndex {
            expected: index,
            actual: state.current_step_index(),
        });
    }
    Ok(())
}

/// Asserts that the summary lists exactly `expected` `(step_order, answer)` pairs.
pub fn assert_summary_answers(
    summary: Option<&Summary>,
    expected: &[(u32, &str)],
) -> Result<(), SessionAssertionError> {
    let summary = summary.ok_or(SessionAssertionError::MissingSummary)?;

    if summary.completed_steps.len() != expected.len() {
        return Err(SessionAssertionError::SummaryLength {
            expected: expected.len(),
            actual: summary.completed_steps.len(),
        });
    }

    for (step_order, answer) in expected {
        let actual = summary.entry(*step_order).map(|e| e.answer.clone());
        if actual.as_deref() != Some(*answer) {
            return Err(SessionAssertionError::SummaryAnswer {
                step_order: *step_order,
                expected: answer.to_string(),
                actual,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidepath_core::SummaryEntry;
    use pretty_assertions::assert_eq;

    fn summary() -> Summary {
        Summary {
            completed_steps: vec![
                SummaryEntry { step_order: 2, question: "Pick".to_string(), answer: "A".to_string() },
                SummaryEntry { step_order: 3, question: "Name".to_string(), answer: "hello".to_string() },
            ],
            total_time_seconds: 61,
        }
    }

    #[test]
    fn test_summary_assertions() {
        let summary = summary();
        assert_eq!(assert_summary_answers(Some(&summary), &[(2, "A"), (3, "hello")]), Ok(()));
        assert_eq!(
            assert_summary_answers(Some(&summary), &[(2, "B"), (3, "hello")]),
            Err(SessionAssertionError::SummaryAnswer {
                step_order: 2,
                expected: "B".to_string(),
                actual: Some("A".to_string()),
            })
        );
        assert_eq!(
            assert_summary_answers(None, &[]),
            Err(SessionAssertionError::MissingSummary)
        );
    }

    #[test]
    fn test_position_assertion_on_fresh_state() {
        let state = SessionState::new();
        assert_eq!(assert_position(&state, SessionPhase::Uninitialized, 0), Ok(()));
        assert!(assert_position(&state, SessionPhase::InProgress, 0).is_err());
    }
}
